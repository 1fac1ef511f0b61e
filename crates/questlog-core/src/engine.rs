//! The engine pipeline.
//!
//! An [`Action`] goes through the mutator (which calls the progression
//! calculator for completions), then the badge evaluator. The result is the
//! next profile snapshot plus every [`Event`] produced on the way, ready to
//! be persisted and rendered by the caller.

use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;
use std::fmt;

use crate::availability;
use crate::badge;
use crate::config::EngineConfig;
use crate::deadline::{self, DeadlineStatus};
use crate::error::Result;
use crate::events::Event;
use crate::mutation::{self, DeadlineRequest, Mutation, NewTask};
use crate::profile::{AvatarConfig, Profile, Theme};
use crate::progression::{self, ExpProgress};
use crate::task::template::GroupTemplate;
use crate::task::{Difficulty, SingleTask, TaskItem};
use crate::unlock::{Feature, Reward};

/// A user action on a profile.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    CompleteTask { task_id: String },
    CompleteSubTask { group_id: String, sub_task_id: String },
    AddTask(NewTask),
    AddTaskGroup(GroupTemplate),
    EditTask { task_id: String, name: String },
    EditSubTask {
        group_id: String,
        sub_task_id: String,
        name: String,
    },
    DeleteTask { task_id: String },
    DeleteTaskGroup { group_id: String },
    DeleteSubTask { group_id: String, sub_task_id: String },
    SaveAvatar(AvatarConfig),
    SetTheme(Theme),
}

impl Action {
    /// Features the presentation layer must have unlocked before offering
    /// this action.
    pub fn required_features(&self) -> Vec<Feature> {
        match self {
            Action::CompleteTask { .. } | Action::CompleteSubTask { .. } => Vec::new(),
            Action::AddTask(request) => {
                let mut features = Vec::new();
                if request.difficulty != Difficulty::Easy {
                    features.push(Feature::SelectDifficulty);
                }
                if request.recurrence.is_recurring() {
                    features.push(Feature::RecurringTasks);
                }
                if request.deadline != DeadlineRequest::None {
                    features.push(Feature::TaskTimeLimit);
                }
                features
            }
            Action::AddTaskGroup(template) => vec![template.feature],
            Action::EditTask { .. } | Action::EditSubTask { .. } => vec![Feature::EditTask],
            Action::DeleteTask { .. }
            | Action::DeleteTaskGroup { .. }
            | Action::DeleteSubTask { .. } => vec![Feature::DeleteTask],
            Action::SaveAvatar(_) => vec![Feature::AvatarCustomization],
            Action::SetTheme(_) => vec![Feature::ThemeSelection],
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::CompleteTask { .. } => "complete_task",
            Action::CompleteSubTask { .. } => "complete_sub_task",
            Action::AddTask(_) => "add_task",
            Action::AddTaskGroup(_) => "add_task_group",
            Action::EditTask { .. } => "edit_task",
            Action::EditSubTask { .. } => "edit_sub_task",
            Action::DeleteTask { .. } => "delete_task",
            Action::DeleteTaskGroup { .. } => "delete_task_group",
            Action::DeleteSubTask { .. } => "delete_sub_task",
            Action::SaveAvatar(_) => "save_avatar",
            Action::SetTheme(_) => "set_theme",
        };
        f.write_str(name)
    }
}

/// What [`Engine::apply`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub profile: Profile,
    pub events: Vec<Event>,
    /// `false` when the snapshot equals the input; nothing needs saving.
    pub changed: bool,
}

/// Progression and unlock engine bound to one configuration.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// First-login profile for `user_id`.
    pub fn new_profile<R: Rng + ?Sized>(&self, user_id: &str, email: &str, rng: &mut R) -> Profile {
        let profile = Profile::for_new_user(user_id, email, &self.config.avatar, rng);
        tracing::info!(profile = %profile.id, name = %profile.name, "profile created");
        profile
    }

    /// Decode a stored profile and bring it under the configured curve.
    /// Groups with no open sub-task are dropped.
    pub fn load(&self, json: &str) -> Result<Profile> {
        let stored = Profile::from_json(json)?;
        let mut profile = progression::normalize(&stored, &self.config.experience.curve);
        profile
            .tasks
            .retain(|item| !matches!(item, TaskItem::Group(group) if group.is_finished()));
        let dropped = stored.tasks.len() - profile.tasks.len();
        if dropped > 0 {
            tracing::warn!(profile = %profile.id, dropped, "dropped finished groups on load");
        }
        Ok(profile)
    }

    /// Run `action` against `profile` at `now`, on the UTC calendar.
    ///
    /// Unlock levels are not enforced here; see [`Engine::locked_feature`].
    pub fn apply(&self, profile: &Profile, action: Action, now: DateTime<Utc>) -> Result<Outcome> {
        self.apply_in(profile, action, &now)
    }

    /// [`Engine::apply`] with recurring-task periods judged in the calendar
    /// of `now`'s zone. Stored timestamps stay UTC.
    pub fn apply_in<Tz: TimeZone>(
        &self,
        profile: &Profile,
        action: Action,
        zoned_now: &DateTime<Tz>,
    ) -> Result<Outcome> {
        tracing::debug!(profile = %profile.id, %action, "applying action");
        let cfg = &self.config;
        let now = zoned_now.with_timezone(&Utc);

        let Mutation {
            profile: mutated,
            mut events,
        } = match action {
            Action::CompleteTask { task_id } => {
                mutation::complete_single_task_in(profile, &task_id, zoned_now, &cfg.experience)
            }
            Action::CompleteSubTask {
                group_id,
                sub_task_id,
            } => mutation::complete_sub_task(profile, &group_id, &sub_task_id, now, &cfg.experience),
            Action::AddTask(request) => mutation::add_task(profile, request, now)?,
            Action::AddTaskGroup(template) => mutation::add_task_group(profile, &template, now)?,
            Action::EditTask { task_id, name } => mutation::edit_task(profile, &task_id, &name, now)?,
            Action::EditSubTask {
                group_id,
                sub_task_id,
                name,
            } => mutation::edit_sub_task(profile, &group_id, &sub_task_id, &name, now)?,
            Action::DeleteTask { task_id } => mutation::delete_task(profile, &task_id, now),
            Action::DeleteTaskGroup { group_id } => {
                mutation::delete_task_group(profile, &group_id, now)
            }
            Action::DeleteSubTask {
                group_id,
                sub_task_id,
            } => mutation::delete_sub_task(profile, &group_id, &sub_task_id, now),
            Action::SaveAvatar(avatar) => mutation::save_avatar(profile, avatar, &cfg.avatar, now)?,
            Action::SetTheme(theme) => mutation::set_theme(profile, theme, now),
        };

        for feature in cfg.unlocks.newly_unlocked(profile.level, mutated.level) {
            let level = cfg.unlocks.threshold(feature);
            tracing::info!(profile = %profile.id, %feature, level, "feature unlocked");
            events.push(Event::FeatureUnlocked {
                feature,
                level,
                at: now,
            });
        }

        let (next, awarded) = badge::award_new_badges(&mutated);
        events.extend(
            awarded
                .into_iter()
                .map(|badge| Event::BadgeAwarded { badge, at: now }),
        );

        let changed = next != *profile;
        Ok(Outcome {
            profile: next,
            events,
            changed,
        })
    }

    pub fn is_unlocked(&self, profile: &Profile, feature: Feature) -> bool {
        self.config.unlocks.is_unlocked(profile.level, feature)
    }

    /// First feature `action` needs that `profile` has not unlocked yet.
    pub fn locked_feature(&self, profile: &Profile, action: &Action) -> Option<Feature> {
        action
            .required_features()
            .into_iter()
            .find(|feature| !self.is_unlocked(profile, *feature))
    }

    pub fn progress(&self, profile: &Profile) -> ExpProgress {
        progression::progress(profile, &self.config.experience.curve)
    }

    pub fn rewards(&self, profile: &Profile) -> Vec<Reward> {
        self.config.unlocks.rewards(profile.level)
    }

    pub fn is_available(&self, task: &SingleTask, now: DateTime<Utc>) -> bool {
        availability::is_available(task, now)
    }

    pub fn is_available_in<Tz: TimeZone>(&self, task: &SingleTask, now: &DateTime<Tz>) -> bool {
        availability::is_available_in(task, now)
    }

    pub fn deadline_status(&self, task: &SingleTask, now: DateTime<Utc>) -> DeadlineStatus {
        deadline::remaining(task, now, &self.config.deadline)
    }
}
