use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::badge::BadgeKind;
use crate::profile::Theme;
use crate::task::Difficulty;
use crate::unlock::Feature;

/// Every change the engine makes to a profile produces an Event.
/// The presentation layer renders them; nothing in the core consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TaskAdded {
        task_id: String,
        name: String,
        at: DateTime<Utc>,
    },
    /// A single task or a sub-task (`sub_task_id` set) was completed.
    TaskCompleted {
        task_id: String,
        sub_task_id: Option<String>,
        name: String,
        difficulty: Difficulty,
        exp_gained: u32,
        at: DateTime<Utc>,
    },
    TaskRenamed {
        task_id: String,
        sub_task_id: Option<String>,
        name: String,
        at: DateTime<Utc>,
    },
    /// A task item, or one sub-task of a group, left the list.
    TaskRemoved {
        task_id: String,
        sub_task_id: Option<String>,
        at: DateTime<Utc>,
    },
    /// Every sub-task of a group was completed and the group was removed.
    GroupCompleted {
        group_id: String,
        name: String,
        at: DateTime<Utc>,
    },
    LevelUp {
        from: u32,
        to: u32,
        at: DateTime<Utc>,
    },
    FeatureUnlocked {
        feature: Feature,
        level: u32,
        at: DateTime<Utc>,
    },
    BadgeAwarded {
        badge: BadgeKind,
        at: DateTime<Utc>,
    },
    AvatarSaved {
        at: DateTime<Utc>,
    },
    ThemeChanged {
        theme: Theme,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TaskAdded { at, .. }
            | Event::TaskCompleted { at, .. }
            | Event::TaskRenamed { at, .. }
            | Event::TaskRemoved { at, .. }
            | Event::GroupCompleted { at, .. }
            | Event::LevelUp { at, .. }
            | Event::FeatureUnlocked { at, .. }
            | Event::BadgeAwarded { at, .. }
            | Event::AvatarSaved { at }
            | Event::ThemeChanged { at, .. } => *at,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::TaskAdded { name, .. } => write!(f, "Added '{name}'"),
            Event::TaskCompleted {
                name, exp_gained, ..
            } => write!(f, "Completed '{name}' (+{exp_gained} exp)"),
            Event::TaskRenamed { name, .. } => write!(f, "Renamed to '{name}'"),
            Event::TaskRemoved {
                task_id,
                sub_task_id: Some(sub_task_id),
                ..
            } => write!(f, "Removed sub-task {sub_task_id} from {task_id}"),
            Event::TaskRemoved { task_id, .. } => write!(f, "Removed {task_id}"),
            Event::GroupCompleted { name, .. } => write!(f, "Finished group '{name}'"),
            Event::LevelUp { to, .. } => write!(f, "Level up! You are now level {to}"),
            Event::FeatureUnlocked { feature, .. } => {
                write!(f, "Unlocked: {}", feature.reward())
            }
            Event::BadgeAwarded { badge, .. } => {
                write!(f, "Badge earned: {}", badge.definition().name)
            }
            Event::AvatarSaved { .. } => write!(f, "Avatar saved"),
            Event::ThemeChanged { theme, .. } => write!(f, "Theme set to {theme}"),
        }
    }
}
