use clap::Subcommand;

use super::Session;

#[derive(Subcommand)]
pub enum RewardsAction {
    /// List every level reward with its unlock state
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show the next reward to unlock
    Next,
}

pub fn run(user: &str, action: RewardsAction) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(user)?;

    match action {
        RewardsAction::List { json } => {
            let rewards = session.engine.rewards(&session.profile);
            if json {
                println!("{}", serde_json::to_string_pretty(&rewards)?);
            } else {
                for reward in &rewards {
                    let mark = if reward.unlocked { "*" } else { " " };
                    println!(
                        "[{mark}] level {:>2}  {:<24} {}",
                        reward.level, reward.feature.key(), reward.description
                    );
                }
            }
        }
        RewardsAction::Next => {
            match session
                .engine
                .config()
                .unlocks
                .next_unlock(session.profile.level)
            {
                Some((feature, level)) => {
                    println!("Level {level}: {} ({feature})", feature.reward())
                }
                None => println!("Everything is unlocked."),
            }
        }
    }
    Ok(())
}
