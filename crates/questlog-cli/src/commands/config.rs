use clap::Subcommand;
use questlog_core::EngineConfig;

use crate::store::Store;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "experience.hard", "unlocks.edit_task")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Print the config file location
    Path,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open()?;

    match action {
        ConfigAction::Get { key } => {
            let config = store.load_config()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = store.load_config()?;
            config.set(&key, &value)?;
            store.save_config(&config)?;
            tracing::info!(%key, %value, "config updated");
            println!("ok");
        }
        ConfigAction::List => {
            let config = store.load_config()?;
            println!("{}", config.to_toml_string()?);
        }
        ConfigAction::Reset => {
            store.save_config(&EngineConfig::default())?;
            println!("config reset to defaults");
        }
        ConfigAction::Path => {
            println!("{}", store.config_path().display());
        }
    }
    Ok(())
}
