//! The player profile.
//!
//! One profile exists per user. It is created on first login and replaced by
//! a new snapshot after every action; the engine never edits a profile in
//! place. The persisted form is a flat camelCase JSON document.

use indexmap::IndexSet;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::badge::BadgeKind;
use crate::config::AvatarOptions;
use crate::error::{Result, ValidationError};
use crate::task::{SingleTask, TaskGroup, TaskItem};

/// Colour scheme of the presentation layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(ValidationError::InvalidTheme(s.to_string())),
        }
    }
}

/// Avatar appearance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarConfig {
    pub body_color: String,
    pub eyes: u32,
    pub mouth: u32,
}

impl AvatarConfig {
    /// Draw a random avatar from the configured options.
    pub fn random<R: Rng + ?Sized>(options: &AvatarOptions, rng: &mut R) -> Self {
        let body_color = if options.colors.is_empty() {
            String::new()
        } else {
            options.colors[rng.gen_range(0..options.colors.len())].clone()
        };
        Self {
            body_color,
            eyes: rng.gen_range(0..options.eyes_count.max(1)),
            mouth: rng.gen_range(0..options.mouths_count.max(1)),
        }
    }

    /// Check every part against the configured options.
    pub fn validate(&self, options: &AvatarOptions) -> Result<(), ValidationError> {
        if !options.colors.iter().any(|c| c == &self.body_color) {
            return Err(ValidationError::InvalidAvatar {
                field: "body color",
                message: format!("'{}' is not in the palette", self.body_color),
            });
        }
        if self.eyes >= options.eyes_count {
            return Err(ValidationError::InvalidAvatar {
                field: "eyes",
                message: format!("{} is out of range 0..{}", self.eyes, options.eyes_count),
            });
        }
        if self.mouth >= options.mouths_count {
            return Err(ValidationError::InvalidAvatar {
                field: "mouth",
                message: format!("{} is out of range 0..{}", self.mouth, options.mouths_count),
            });
        }
        Ok(())
    }
}

/// A player's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    /// Experience toward the next level; always below the current requirement.
    pub exp: u32,
    /// Current level, starting at 1.
    pub level: u32,
    #[serde(default)]
    pub tasks: Vec<TaskItem>,
    #[serde(default)]
    pub completed_tasks_count: u32,
    pub avatar: AvatarConfig,
    #[serde(default)]
    pub theme: Theme,
    /// Awarded badges in award order.
    #[serde(default)]
    pub badges: IndexSet<BadgeKind>,
}

impl Profile {
    /// A fresh level-1 profile.
    pub fn new(id: impl Into<String>, name: impl Into<String>, avatar: AvatarConfig) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            exp: 0,
            level: 1,
            tasks: Vec::new(),
            completed_tasks_count: 0,
            avatar,
            theme: Theme::Light,
            badges: IndexSet::new(),
        }
    }

    /// Profile created on first login from the identity provider's data.
    ///
    /// The display name is the part of the email before `@`; the avatar is
    /// drawn at random.
    pub fn for_new_user<R: Rng + ?Sized>(
        user_id: &str,
        email: &str,
        options: &AvatarOptions,
        rng: &mut R,
    ) -> Self {
        let name = email.split('@').next().unwrap_or_default().trim();
        let name = if name.is_empty() { "New Player" } else { name };
        Self::new(user_id, name, AvatarConfig::random(options, rng))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn has_badge(&self, kind: BadgeKind) -> bool {
        self.badges.contains(&kind)
    }

    pub fn task(&self, id: &str) -> Option<&TaskItem> {
        self.tasks.iter().find(|item| item.id() == id)
    }

    pub fn single_task(&self, id: &str) -> Option<&SingleTask> {
        self.task(id).and_then(TaskItem::as_single)
    }

    pub fn group(&self, id: &str) -> Option<&TaskGroup> {
        self.task(id).and_then(TaskItem::as_group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;
    use serde_json::json;

    #[test]
    fn new_user_takes_name_from_email() {
        let mut rng = Pcg64::seed_from_u64(7);
        let options = AvatarOptions::default();
        let profile = Profile::for_new_user("uid-1", "ada.lovelace@example.com", &options, &mut rng);

        assert_eq!(profile.name, "ada.lovelace");
        assert_eq!(profile.level, 1);
        assert_eq!(profile.exp, 0);
        assert!(profile.tasks.is_empty());
        assert!(profile.badges.is_empty());
        assert!(profile.avatar.validate(&options).is_ok());
    }

    #[test]
    fn blank_email_falls_back_to_default_name() {
        let mut rng = Pcg64::seed_from_u64(1);
        let profile = Profile::for_new_user("uid", "@example.com", &AvatarOptions::default(), &mut rng);
        assert_eq!(profile.name, "New Player");
    }

    #[test]
    fn avatar_validation_checks_every_part() {
        let options = AvatarOptions::default();
        let mut avatar = AvatarConfig {
            body_color: "#ff6b6b".into(),
            eyes: 4,
            mouth: 0,
        };
        assert!(avatar.validate(&options).is_ok());

        avatar.eyes = 5;
        assert!(matches!(
            avatar.validate(&options),
            Err(ValidationError::InvalidAvatar { field: "eyes", .. })
        ));

        avatar.eyes = 0;
        avatar.body_color = "#000000".into();
        assert!(matches!(
            avatar.validate(&options),
            Err(ValidationError::InvalidAvatar { field: "body color", .. })
        ));
    }

    #[test]
    fn theme_parses_and_toggles() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn decodes_persisted_document() {
        let doc = json!({
            "id": "uid-9",
            "name": "sam",
            "exp": 35,
            "level": 4,
            "tasks": [
                { "type": "single", "id": "t1", "name": "Read", "difficulty": "easy", "deadlineType": "none" }
            ],
            "completedTasksCount": 12,
            "avatar": { "bodyColor": "#48dbfb", "eyes": 2, "mouth": 3 },
            "theme": "dark",
            "badges": ["NOVICE", "AVATAR_STYLIST"]
        });
        let profile = Profile::from_json(&doc.to_string()).unwrap();

        assert_eq!(profile.completed_tasks_count, 12);
        assert_eq!(profile.theme, Theme::Dark);
        assert!(profile.has_badge(BadgeKind::Novice));
        assert!(profile.has_badge(BadgeKind::AvatarStylist));
        assert_eq!(profile.single_task("t1").unwrap().name, "Read");
        assert!(profile.group("t1").is_none());

        let back: serde_json::Value = serde_json::from_str(&profile.to_json().unwrap()).unwrap();
        assert_eq!(back["completedTasksCount"], 12);
        assert_eq!(back["avatar"]["bodyColor"], "#48dbfb");
        assert_eq!(back["badges"], json!(["NOVICE", "AVATAR_STYLIST"]));
    }

    #[test]
    fn unknown_badge_is_rejected() {
        let doc = json!({
            "id": "uid", "name": "x", "exp": 0, "level": 1,
            "avatar": { "bodyColor": "#48dbfb", "eyes": 0, "mouth": 0 },
            "badges": ["SPEEDRUNNER"]
        });
        assert!(Profile::from_json(&doc.to_string()).is_err());
    }
}
