//! File-backed persistence for profiles and engine configuration.
//!
//! Layout under the data directory:
//!
//! ```text
//! config.toml
//! profiles/<user id>.json
//! ```
//!
//! Writes go to a sibling temp file which is then renamed over the target.
//! There is no locking; concurrent writers are last-write-wins.

use std::path::{Path, PathBuf};

use questlog_core::{Engine, EngineConfig, Profile};

/// Returns the data directory, creating it if needed.
///
/// `QUESTLOG_HOME` wins when set. Otherwise `~/.config/questlog`, or
/// `~/.config/questlog-dev` with `QUESTLOG_ENV=dev`.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let dir = match std::env::var_os("QUESTLOG_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("QUESTLOG_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("questlog-dev")
            } else {
                base_dir.join("questlog")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Profile and config files under one data directory.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::at(data_dir()?))
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join("config.toml")
    }

    /// Load the engine configuration; a missing file means defaults.
    pub fn load_config(&self) -> Result<EngineConfig, Box<dyn std::error::Error>> {
        match std::fs::read_to_string(self.config_path()) {
            Ok(content) => Ok(EngineConfig::from_toml_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(EngineConfig::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_config(&self, config: &EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
        write_atomic(&self.config_path(), &config.to_toml_string()?)
    }

    fn profile_path(&self, user_id: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
        validate_user_id(user_id)?;
        Ok(self.dir.join("profiles").join(format!("{user_id}.json")))
    }

    /// Load the profile stored for `user_id`, normalized under the engine's
    /// curve. `None` if the user has never logged in.
    pub fn load_profile(
        &self,
        engine: &Engine,
        user_id: &str,
    ) -> Result<Option<Profile>, Box<dyn std::error::Error>> {
        let path = self.profile_path(user_id)?;
        match std::fs::read_to_string(&path) {
            Ok(json) => {
                let profile = engine
                    .load(&json)
                    .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
                Ok(Some(profile))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_profile(&self, profile: &Profile) -> Result<(), Box<dyn std::error::Error>> {
        let path = self.profile_path(&profile.id)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        write_atomic(&path, &profile.to_json()?)?;
        tracing::debug!(profile = %profile.id, path = %path.display(), "profile saved");
        Ok(())
    }
}

fn write_atomic(path: &Path, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// User ids become file names.
fn validate_user_id(user_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let valid = !user_id.is_empty()
        && !user_id.starts_with('.')
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(format!("invalid user id '{user_id}': use letters, digits, '-', '_' or '.'").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use questlog_core::AvatarConfig;

    fn profile(id: &str) -> Profile {
        Profile::new(
            id,
            "tester",
            AvatarConfig {
                body_color: "#ff6b6b".into(),
                eyes: 1,
                mouth: 2,
            },
        )
    }

    #[test]
    fn missing_files_mean_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::at(dir.path());
        assert_eq!(store.load_config().unwrap(), EngineConfig::default());
        assert!(store
            .load_profile(&Engine::default(), "nobody")
            .unwrap()
            .is_none());
    }

    #[test]
    fn profile_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::at(dir.path());
        let mut saved = profile("alice");
        saved.exp = 42;
        store.save_profile(&saved).unwrap();

        let loaded = store
            .load_profile(&Engine::default(), "alice")
            .unwrap()
            .unwrap();
        assert_eq!(loaded, saved);
        assert!(dir.path().join("profiles/alice.json").exists());
        assert!(!dir.path().join("profiles/alice.tmp").exists());
    }

    #[test]
    fn config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::at(dir.path());
        let mut config = EngineConfig::default();
        config.set("experience.hard", "55").unwrap();
        store.save_config(&config).unwrap();
        assert_eq!(store.load_config().unwrap().experience.hard, 55);
    }

    #[test]
    fn broken_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::at(dir.path());
        std::fs::write(store.config_path(), "[experience]\neasy = 0\n").unwrap();
        assert!(store.load_config().is_err());
    }

    #[test]
    fn user_ids_cannot_escape_the_directory() {
        let store = Store::at("/tmp/unused");
        assert!(store.load_profile(&Engine::default(), "../etc").is_err());
        assert!(store.load_profile(&Engine::default(), "").is_err());
        assert!(validate_user_id("user-1.backup").is_ok());
    }
}
