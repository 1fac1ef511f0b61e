//! Level-gated features.
//!
//! Every feature has a minimum level stored in the [`UnlockTable`]. The gate
//! is a pure, total function of the level: a feature unlocked at level `L` is
//! unlocked at every level above `L`.
//!
//! The table itself is configuration (see [`crate::config::EngineConfig`]);
//! it must name every [`Feature`], which [`UnlockTable::validate`] checks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, ValidationError};

/// A feature or content bundle that opens up with levels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    DeleteTask,
    EditTask,
    ShowCompletedCount,
    SelectDifficulty,
    Badges,
    Avatar,
    AvatarCustomization,
    ExpProgressBar,
    ThemeSelection,
    TaskGroupKitchen,
    RecurringTasks,
    TaskGroupBathroom,
    LevelUpAnimation,
    TaskGroupBedroom,
    CustomTaskGroups,
    ExpertStats,
    TaskTimeLimit,
    TaskTimeNotifications,
}

impl Feature {
    pub const ALL: [Feature; 18] = [
        Feature::DeleteTask,
        Feature::EditTask,
        Feature::ShowCompletedCount,
        Feature::SelectDifficulty,
        Feature::Badges,
        Feature::Avatar,
        Feature::AvatarCustomization,
        Feature::ExpProgressBar,
        Feature::ThemeSelection,
        Feature::TaskGroupKitchen,
        Feature::RecurringTasks,
        Feature::TaskGroupBathroom,
        Feature::LevelUpAnimation,
        Feature::TaskGroupBedroom,
        Feature::CustomTaskGroups,
        Feature::ExpertStats,
        Feature::TaskTimeLimit,
        Feature::TaskTimeNotifications,
    ];

    /// Configuration key of this feature.
    pub fn key(&self) -> &'static str {
        match self {
            Feature::DeleteTask => "delete_task",
            Feature::EditTask => "edit_task",
            Feature::ShowCompletedCount => "show_completed_count",
            Feature::SelectDifficulty => "select_difficulty",
            Feature::Badges => "badges",
            Feature::Avatar => "avatar",
            Feature::AvatarCustomization => "avatar_customization",
            Feature::ExpProgressBar => "exp_progress_bar",
            Feature::ThemeSelection => "theme_selection",
            Feature::TaskGroupKitchen => "task_group_kitchen",
            Feature::RecurringTasks => "recurring_tasks",
            Feature::TaskGroupBathroom => "task_group_bathroom",
            Feature::LevelUpAnimation => "level_up_animation",
            Feature::TaskGroupBedroom => "task_group_bedroom",
            Feature::CustomTaskGroups => "custom_task_groups",
            Feature::ExpertStats => "expert_stats",
            Feature::TaskTimeLimit => "task_time_limit",
            Feature::TaskTimeNotifications => "task_time_notifications",
        }
    }

    /// Reward text shown when the feature opens up.
    pub fn reward(&self) -> &'static str {
        match self {
            Feature::DeleteTask => "Delete tasks",
            Feature::EditTask => "Edit tasks",
            Feature::ShowCompletedCount => "Completed task counter",
            Feature::SelectDifficulty => "Task difficulty levels",
            Feature::Badges => "Activity badges",
            Feature::Avatar => "Character avatar",
            Feature::AvatarCustomization => "Avatar customization",
            Feature::ExpProgressBar => "Experience progress bar",
            Feature::ThemeSelection => "Light/dark theme selection",
            Feature::TaskGroupKitchen => "Task group: kitchen cleanup",
            Feature::RecurringTasks => "Recurring tasks",
            Feature::TaskGroupBathroom => "Task group: bathroom cleanup",
            Feature::LevelUpAnimation => "Level-up animation and sound",
            Feature::TaskGroupBedroom => "Task group: bedroom cleanup",
            Feature::CustomTaskGroups => "Create your own task groups",
            Feature::ExpertStats => "Expert mode: statistics and charts",
            Feature::TaskTimeLimit => "Task time limits (deadline or duration)",
            Feature::TaskTimeNotifications => "Notifications for expiring tasks",
        }
    }

    /// Level at which the feature opens in the stock configuration.
    pub fn default_level(&self) -> u32 {
        match self {
            Feature::DeleteTask => 2,
            Feature::EditTask => 3,
            Feature::ShowCompletedCount => 4,
            Feature::SelectDifficulty => 5,
            Feature::Badges => 6,
            Feature::Avatar => 7,
            Feature::AvatarCustomization => 8,
            Feature::ExpProgressBar => 9,
            Feature::ThemeSelection => 10,
            Feature::TaskGroupKitchen => 11,
            Feature::RecurringTasks => 12,
            Feature::TaskGroupBathroom => 13,
            Feature::LevelUpAnimation => 14,
            Feature::TaskGroupBedroom => 15,
            Feature::CustomTaskGroups => 17,
            Feature::ExpertStats => 20,
            Feature::TaskTimeLimit => 23,
            Feature::TaskTimeNotifications => 30,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Feature {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .iter()
            .copied()
            .find(|feature| feature.key() == s)
            .ok_or_else(|| ValidationError::UnknownFeature(s.to_string()))
    }
}

/// Minimum level per feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnlockTable(BTreeMap<Feature, u32>);

impl Default for UnlockTable {
    fn default() -> Self {
        Self(
            Feature::ALL
                .iter()
                .map(|feature| (*feature, feature.default_level()))
                .collect(),
        )
    }
}

impl UnlockTable {
    /// Every feature must have a threshold of at least 1.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for feature in Feature::ALL {
            match self.0.get(&feature) {
                None => return Err(ConfigError::MissingKey(format!("unlocks.{}", feature))),
                Some(0) => {
                    return Err(ConfigError::InvalidValue {
                        key: format!("unlocks.{}", feature),
                        message: "unlock level must be at least 1".into(),
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Minimum level for `feature`.
    ///
    /// Tables that went through [`UnlockTable::validate`] are total; a
    /// feature missing from an unvalidated table falls back to its stock level.
    pub fn threshold(&self, feature: Feature) -> u32 {
        self.0
            .get(&feature)
            .copied()
            .unwrap_or_else(|| feature.default_level())
    }

    pub fn set_threshold(&mut self, feature: Feature, level: u32) {
        self.0.insert(feature, level);
    }

    /// `level >= threshold(feature)`.
    pub fn is_unlocked(&self, level: u32, feature: Feature) -> bool {
        level >= self.threshold(feature)
    }

    /// String-keyed gate. Unknown keys are a configuration error.
    pub fn is_unlocked_key(&self, level: u32, key: &str) -> Result<bool, ValidationError> {
        let feature: Feature = key.parse()?;
        Ok(self.is_unlocked(level, feature))
    }

    /// Features open at `level`, ordered by threshold.
    pub fn unlocked_features(&self, level: u32) -> Vec<Feature> {
        self.by_level()
            .into_iter()
            .filter(|(_, threshold)| *threshold <= level)
            .map(|(feature, _)| feature)
            .collect()
    }

    /// Features that open when moving from `from` to `to` (exclusive, inclusive).
    pub fn newly_unlocked(&self, from: u32, to: u32) -> Vec<Feature> {
        self.by_level()
            .into_iter()
            .filter(|(_, threshold)| *threshold > from && *threshold <= to)
            .map(|(feature, _)| feature)
            .collect()
    }

    /// Closest locked feature above `level`, if any.
    pub fn next_unlock(&self, level: u32) -> Option<(Feature, u32)> {
        self.by_level()
            .into_iter()
            .find(|(_, threshold)| *threshold > level)
    }

    /// All rewards with their unlock state at `level`.
    pub fn rewards(&self, level: u32) -> Vec<Reward> {
        self.by_level()
            .into_iter()
            .map(|(feature, threshold)| Reward {
                feature,
                level: threshold,
                description: feature.reward(),
                unlocked: level >= threshold,
            })
            .collect()
    }

    fn by_level(&self) -> Vec<(Feature, u32)> {
        let mut entries: Vec<(Feature, u32)> = Feature::ALL
            .iter()
            .map(|feature| (*feature, self.threshold(*feature)))
            .collect();
        entries.sort_by_key(|(feature, threshold)| (*threshold, *feature));
        entries
    }
}

/// One row of the rewards screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reward {
    pub feature: Feature,
    pub level: u32,
    pub description: &'static str,
    pub unlocked: bool,
}
