//! TOML-based engine configuration.
//!
//! Everything the rules depend on is configuration rather than code:
//! - experience per difficulty and the experience curve
//! - the feature unlock table
//! - avatar option cardinalities and palette
//! - deadline severity thresholds
//!
//! Loading and saving the file is the caller's job; this module only parses,
//! validates and edits the in-memory value.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::ConfigError;
use crate::progression::ExperienceCurve;
use crate::task::Difficulty;
use crate::unlock::UnlockTable;

/// Experience configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceConfig {
    #[serde(default = "default_easy_exp")]
    pub easy: u32,
    #[serde(default = "default_medium_exp")]
    pub medium: u32,
    #[serde(default = "default_hard_exp")]
    pub hard: u32,
    #[serde(default)]
    pub curve: ExperienceCurve,
}

/// Avatar options offered by the customization screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarOptions {
    #[serde(default = "default_avatar_colors")]
    pub colors: Vec<String>,
    #[serde(default = "default_option_count")]
    pub eyes_count: u32,
    #[serde(default = "default_option_count")]
    pub mouths_count: u32,
}

/// Severity thresholds for the deadline tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadlineConfig {
    /// Fixed deadlines closer than this many days are critical.
    #[serde(default = "default_critical_days")]
    pub critical_days: u32,
    /// Duration windows with less than this share of time left are critical.
    #[serde(default = "default_critical_fraction")]
    pub critical_fraction: f64,
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub experience: ExperienceConfig,
    #[serde(default)]
    pub unlocks: UnlockTable,
    #[serde(default)]
    pub avatar: AvatarOptions,
    #[serde(default)]
    pub deadline: DeadlineConfig,
}

// Default functions
fn default_easy_exp() -> u32 {
    10
}
fn default_medium_exp() -> u32 {
    20
}
fn default_hard_exp() -> u32 {
    40
}
fn default_avatar_colors() -> Vec<String> {
    [
        "#ff6b6b", "#48dbfb", "#1dd1a1", "#feca57", "#ff9f43", "#70a1ff", "#5f27cd", "#a29bfe",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}
fn default_option_count() -> u32 {
    5
}
fn default_critical_days() -> u32 {
    3
}
fn default_critical_fraction() -> f64 {
    0.25
}

impl Default for ExperienceConfig {
    fn default() -> Self {
        Self {
            easy: default_easy_exp(),
            medium: default_medium_exp(),
            hard: default_hard_exp(),
            curve: ExperienceCurve::default(),
        }
    }
}

impl Default for AvatarOptions {
    fn default() -> Self {
        Self {
            colors: default_avatar_colors(),
            eyes_count: default_option_count(),
            mouths_count: default_option_count(),
        }
    }
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self {
            critical_days: default_critical_days(),
            critical_fraction: default_critical_fraction(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            experience: ExperienceConfig::default(),
            unlocks: UnlockTable::default(),
            avatar: AvatarOptions::default(),
            deadline: DeadlineConfig::default(),
        }
    }
}

impl ExperienceConfig {
    /// Experience granted for completing a task of `difficulty`.
    pub fn gain(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document. Missing sections take defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeFailed(e.to_string()))
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for difficulty in Difficulty::ALL {
            if self.experience.gain(difficulty) == 0 {
                return Err(ConfigError::InvalidValue {
                    key: format!("experience.{}", difficulty),
                    message: "experience gain must be positive".into(),
                });
            }
        }
        self.experience.curve.validate()?;
        self.unlocks.validate()?;

        if self.avatar.colors.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "avatar.colors".into(),
                message: "at least one color is required".into(),
            });
        }
        if self.avatar.eyes_count == 0 || self.avatar.mouths_count == 0 {
            return Err(ConfigError::InvalidValue {
                key: "avatar".into(),
                message: "eyes_count and mouths_count must be at least 1".into(),
            });
        }

        let fraction = self.deadline.critical_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(ConfigError::InvalidValue {
                key: "deadline.critical_fraction".into(),
                message: format!("must be in (0, 1], got {fraction}"),
            });
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match node(&json, key)? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key.
    ///
    /// The edited configuration is validated before it replaces `self`; on
    /// error `self` is left untouched.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::SerializeFailed(e.to_string()))?;
        let slot = node_mut(&mut json, key).ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        *slot = parse_like(slot, value).map_err(|message| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        })?;
        let updated: EngineConfig = serde_json::from_value(json).map_err(|e| {
            ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

/// Node at a dot-separated path. Every segment must name an object field.
fn node<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.')
        .try_fold(root, |current, part| current.as_object()?.get(part))
}

fn node_mut<'a>(root: &'a mut Value, key: &str) -> Option<&'a mut Value> {
    key.split('.')
        .try_fold(root, |current, part| current.as_object_mut()?.get_mut(part))
}

/// Parse `raw` into the JSON type `current` already has. Whole numbers stay
/// whole; sections and lists take JSON text.
fn parse_like(current: &Value, raw: &str) -> Result<Value, String> {
    match current {
        Value::Bool(_) => raw
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|_| format!("expected true or false, got '{raw}'")),
        Value::Number(n) if n.is_u64() => raw
            .parse::<u64>()
            .map(Value::from)
            .map_err(|_| format!("expected a whole number, got '{raw}'")),
        Value::Number(_) => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("expected a number, got '{raw}'")),
        Value::String(_) => Ok(Value::String(raw.to_string())),
        Value::Array(_) | Value::Object(_) => {
            serde_json::from_str(raw).map_err(|e| format!("expected JSON: {e}"))
        }
        Value::Null => Err("key has no settable value".into()),
    }
}
