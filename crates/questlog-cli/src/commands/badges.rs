use clap::Subcommand;
use questlog_core::{Feature, BADGES};
use serde::Serialize;

use super::Session;

#[derive(Subcommand)]
pub enum BadgesAction {
    /// List every badge and whether it has been earned
    List {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct BadgeRow {
    kind: String,
    name: &'static str,
    description: &'static str,
    earned: bool,
}

pub fn run(user: &str, action: BadgesAction) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(user)?;
    session.require(Feature::Badges)?;

    match action {
        BadgesAction::List { json } => {
            let rows: Vec<BadgeRow> = BADGES
                .iter()
                .map(|badge| BadgeRow {
                    kind: badge.kind.to_string(),
                    name: badge.name,
                    description: badge.description,
                    earned: session.profile.has_badge(badge.kind),
                })
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for row in &rows {
                    let mark = if row.earned { "*" } else { " " };
                    println!("[{mark}] {:<16} {}", row.name, row.description);
                }
            }
        }
    }
    Ok(())
}
