//! Profile commands: first login, summary, avatar and theme.

use clap::Subcommand;
use questlog_core::{Action, AvatarConfig, Engine, Feature, Profile, Theme};

use super::Session;
use crate::store::Store;

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Create the profile for this user (first login)
    Init {
        /// Email of the account; the part before '@' becomes the display name
        #[arg(long)]
        email: String,
    },
    /// Show level, experience and unlocked extras
    Show {
        /// Print the stored profile document
        #[arg(long)]
        json: bool,
    },
    /// Customize the avatar
    Avatar {
        /// Body color from the configured palette (e.g. "#48dbfb")
        #[arg(long)]
        color: Option<String>,
        /// Eyes variant index
        #[arg(long)]
        eyes: Option<u32>,
        /// Mouth variant index
        #[arg(long)]
        mouth: Option<u32>,
    },
    /// Set the theme: light, dark or toggle
    Theme {
        theme: String,
    },
}

pub fn run(user: &str, action: ProfileAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ProfileAction::Init { email } => init(user, &email),
        ProfileAction::Show { json } => show(&Session::open(user)?, json),
        ProfileAction::Avatar { color, eyes, mouth } => {
            let mut session = Session::open(user)?;
            let current = &session.profile.avatar;
            let avatar = AvatarConfig {
                body_color: color.unwrap_or_else(|| current.body_color.clone()),
                eyes: eyes.unwrap_or(current.eyes),
                mouth: mouth.unwrap_or(current.mouth),
            };
            session.apply(Action::SaveAvatar(avatar))?;
            Ok(())
        }
        ProfileAction::Theme { theme } => {
            let mut session = Session::open(user)?;
            let theme = if theme.eq_ignore_ascii_case("toggle") {
                session.profile.theme.toggled()
            } else {
                theme.parse::<Theme>()?
            };
            session.apply(Action::SetTheme(theme))?;
            Ok(())
        }
    }
}

fn init(user: &str, email: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open()?;
    let engine = Engine::new(store.load_config()?);
    if let Some(existing) = store.load_profile(&engine, user)? {
        println!("Welcome back, {} (level {})", existing.name, existing.level);
        return Ok(());
    }

    let profile = engine.new_profile(user, email, &mut rand::thread_rng());
    store.save_profile(&profile)?;
    println!("Profile created: {}", profile.name);
    Ok(())
}

fn show(session: &Session, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let profile = &session.profile;
    if json {
        println!("{}", profile.to_json()?);
        return Ok(());
    }

    let engine = &session.engine;
    let progress = engine.progress(profile);
    println!("{} (level {})", profile.name, profile.level);
    println!("Experience: {}/{}", progress.exp, progress.required);
    if engine.is_unlocked(profile, Feature::ExpProgressBar) {
        println!("{}", progress_bar(progress.fraction, 30));
    }
    if engine.is_unlocked(profile, Feature::ShowCompletedCount) {
        println!("Completed tasks: {}", profile.completed_tasks_count);
    }
    if engine.is_unlocked(profile, Feature::Avatar) {
        let avatar = &profile.avatar;
        println!(
            "Avatar: color {} / eyes {} / mouth {}",
            avatar.body_color, avatar.eyes, avatar.mouth
        );
    }
    println!("Theme: {}", profile.theme);
    if engine.is_unlocked(profile, Feature::ExpertStats) {
        expert_stats(profile);
    }
    if let Some((feature, level)) = engine.config().unlocks.next_unlock(profile.level) {
        println!("Next unlock at level {level}: {}", feature.reward());
    }
    Ok(())
}

fn expert_stats(profile: &Profile) {
    let singles = profile.tasks.iter().filter_map(|t| t.as_single()).count();
    let recurring = profile
        .tasks
        .iter()
        .filter_map(|t| t.as_single())
        .filter(|t| t.is_recurring())
        .count();
    let groups = profile.tasks.iter().filter_map(|t| t.as_group()).count();
    println!("Open tasks: {singles} ({recurring} recurring), groups: {groups}");
    println!("Badges: {}", profile.badges.len());
}

fn progress_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        fraction * 100.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(0.5, 10), "[#####-----]  50%");
        assert_eq!(progress_bar(0.0, 4), "[----]   0%");
    }
}
