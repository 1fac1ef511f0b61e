use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod store;

#[derive(Parser)]
#[command(name = "questlog", version, about = "Questlog: level up by getting things done")]
struct Cli {
    /// User the profile belongs to
    #[arg(long, global = true, default_value = "local")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Profile, avatar and theme
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
    /// Single tasks
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Task groups
    Group {
        #[command(subcommand)]
        action: commands::group::GroupAction,
    },
    /// Earned and open badges
    Badges {
        #[command(subcommand)]
        action: commands::badges::BadgesAction,
    },
    /// Level rewards
    Rewards {
        #[command(subcommand)]
        action: commands::rewards::RewardsAction,
    },
    /// Engine configuration
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Logs go to stderr so stdout stays parseable for `--json`.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "questlog=info".into()),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let user = cli.user.as_str();
    let result = match cli.command {
        Commands::Profile { action } => commands::profile::run(user, action),
        Commands::Task { action } => commands::task::run(user, action),
        Commands::Group { action } => commands::group::run(user, action),
        Commands::Badges { action } => commands::badges::run(user, action),
        Commands::Rewards { action } => commands::rewards::run(user, action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
