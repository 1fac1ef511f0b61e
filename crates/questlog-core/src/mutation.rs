//! Task and group mutations.
//!
//! Every operation takes the current snapshot by reference and returns the
//! next one together with the events it produced; the input profile is never
//! touched. An identifier that is no longer present is not an error: the
//! profile comes back unchanged and no events are reported.
//!
//! Mutations do not check unlock levels. Gating belongs to the caller (see
//! [`crate::engine::Engine::locked_feature`]).

use chrono::{DateTime, TimeZone, Utc};

use crate::availability;
use crate::badge::{award_event_badge, BadgeKind};
use crate::config::{AvatarOptions, ExperienceConfig};
use crate::error::ValidationError;
use crate::events::Event;
use crate::profile::{AvatarConfig, Profile, Theme};
use crate::progression;
use crate::task::template::GroupTemplate;
use crate::task::{Deadline, Difficulty, Recurrence, SingleTask, TaskItem};

/// The next snapshot and what happened on the way there.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub profile: Profile,
    pub events: Vec<Event>,
}

impl Mutation {
    fn unchanged(profile: &Profile) -> Self {
        Self {
            profile: profile.clone(),
            events: Vec::new(),
        }
    }

    /// `true` when nothing happened.
    pub fn is_noop(&self) -> bool {
        self.events.is_empty()
    }
}

/// Deadline asked for when creating a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeadlineRequest {
    #[default]
    None,
    At(DateTime<Utc>),
    /// Window of this many minutes, opened when the task is created.
    Minutes(i64),
}

/// Input for [`add_task`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub name: String,
    pub difficulty: Difficulty,
    pub recurrence: Recurrence,
    pub deadline: DeadlineRequest,
}

impl NewTask {
    pub fn new(name: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            name: name.into(),
            difficulty,
            recurrence: Recurrence::None,
            deadline: DeadlineRequest::None,
        }
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = recurrence;
        self
    }

    pub fn with_deadline(mut self, deadline: DeadlineRequest) -> Self {
        self.deadline = deadline;
        self
    }
}

// ── Completion ───────────────────────────────────────────────────────

/// Complete a single task, judging recurrence on the UTC calendar.
///
/// Recurring tasks are stamped with `now` and stay in the list; one-shot
/// tasks are removed. A recurring task that is not available yet is a
/// double submission and leaves the profile unchanged.
pub fn complete_single_task(
    profile: &Profile,
    task_id: &str,
    now: DateTime<Utc>,
    config: &ExperienceConfig,
) -> Mutation {
    complete_single_task_in(profile, task_id, &now, config)
}

/// [`complete_single_task`] with daily, weekly and monthly periods taken
/// from the calendar of `now`'s zone.
pub fn complete_single_task_in<Tz: TimeZone>(
    profile: &Profile,
    task_id: &str,
    now: &DateTime<Tz>,
    config: &ExperienceConfig,
) -> Mutation {
    let Some((index, task)) = find_single(profile, task_id) else {
        tracing::debug!(task_id, "complete: no such task");
        return Mutation::unchanged(profile);
    };
    if task.is_recurring() && !availability::is_available_in(task, now) {
        tracing::debug!(task_id, "complete: recurring task not available yet");
        return Mutation::unchanged(profile);
    }
    let now = now.with_timezone(&Utc);

    let mut next = profile.clone();
    if task.is_recurring() {
        if let TaskItem::Single(stamped) = &mut next.tasks[index] {
            stamped.last_completed = Some(now);
        }
    } else {
        next.tasks.remove(index);
    }

    let (exp_gained, level_up) = credit(&mut next, task.difficulty, config, now);
    let mut events = vec![Event::TaskCompleted {
        task_id: task.id.clone(),
        sub_task_id: None,
        name: task.name.clone(),
        difficulty: task.difficulty,
        exp_gained,
        at: now,
    }];
    events.extend(level_up);

    Mutation {
        profile: next,
        events,
    }
}

/// Complete one sub-task of a group.
///
/// When this was the last open sub-task the group is removed and
/// GROUP_SPECIALIST is awarded if not held yet.
pub fn complete_sub_task(
    profile: &Profile,
    group_id: &str,
    sub_task_id: &str,
    now: DateTime<Utc>,
    config: &ExperienceConfig,
) -> Mutation {
    let Some(index) = group_index(profile, group_id) else {
        tracing::debug!(group_id, "complete: no such group");
        return Mutation::unchanged(profile);
    };

    let mut next = profile.clone();
    let TaskItem::Group(group) = &mut next.tasks[index] else {
        return Mutation::unchanged(profile);
    };
    let Some(sub_task) = group.sub_tasks.iter_mut().find(|s| s.id == sub_task_id) else {
        tracing::debug!(group_id, sub_task_id, "complete: no such sub-task");
        return Mutation::unchanged(profile);
    };
    if sub_task.completed {
        return Mutation::unchanged(profile);
    }
    sub_task.completed = true;
    let name = sub_task.name.clone();
    let difficulty = sub_task.difficulty;
    let finished = group.is_finished();
    let group_name = group.name.clone();

    let (exp_gained, level_up) = credit(&mut next, difficulty, config, now);
    let mut events = vec![Event::TaskCompleted {
        task_id: group_id.to_string(),
        sub_task_id: Some(sub_task_id.to_string()),
        name,
        difficulty,
        exp_gained,
        at: now,
    }];
    events.extend(level_up);

    if finished {
        next.tasks.remove(index);
        tracing::info!(profile = %next.id, group_id, "group completed");
        events.push(Event::GroupCompleted {
            group_id: group_id.to_string(),
            name: group_name,
            at: now,
        });
        if award_event_badge(&mut next, BadgeKind::GroupSpecialist) {
            events.push(Event::BadgeAwarded {
                badge: BadgeKind::GroupSpecialist,
                at: now,
            });
        }
    }

    Mutation {
        profile: next,
        events,
    }
}

/// Apply experience for one completion and bump the completed count.
fn credit(
    profile: &mut Profile,
    difficulty: Difficulty,
    config: &ExperienceConfig,
    now: DateTime<Utc>,
) -> (u32, Option<Event>) {
    let progression = progression::apply_completion(profile, difficulty, config);
    let from = profile.level;
    profile.level = progression.level;
    profile.exp = progression.exp;
    profile.completed_tasks_count = profile.completed_tasks_count.saturating_add(1);

    let level_up = progression.leveled_up().then(|| {
        tracing::info!(profile = %profile.id, from, to = progression.level, "level up");
        Event::LevelUp {
            from,
            to: progression.level,
            at: now,
        }
    });
    (progression.exp_gained, level_up)
}

// ── Creation ─────────────────────────────────────────────────────────

/// Append a single task. A duration deadline opens its window at `now`.
pub fn add_task(
    profile: &Profile,
    request: NewTask,
    now: DateTime<Utc>,
) -> Result<Mutation, ValidationError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName("Task"));
    }
    if let Recurrence::Custom { days: 0 } = request.recurrence {
        return Err(ValidationError::InvalidRecurrenceDays(0));
    }
    let deadline = match request.deadline {
        DeadlineRequest::None => Deadline::None,
        DeadlineRequest::At(at) => Deadline::At(at),
        DeadlineRequest::Minutes(minutes) => Deadline::window(now, minutes)?,
    };

    let task = SingleTask::new(name, request.difficulty)
        .with_recurrence(request.recurrence)
        .with_deadline(deadline);
    tracing::debug!(profile = %profile.id, task_id = %task.id, "task added");

    let event = Event::TaskAdded {
        task_id: task.id.clone(),
        name: task.name.clone(),
        at: now,
    };
    let mut next = profile.clone();
    next.tasks.push(task.into());
    Ok(Mutation {
        profile: next,
        events: vec![event],
    })
}

/// Append a group built from `template`.
pub fn add_task_group(
    profile: &Profile,
    template: &GroupTemplate,
    now: DateTime<Utc>,
) -> Result<Mutation, ValidationError> {
    let group = template.instantiate()?;
    tracing::debug!(profile = %profile.id, group_id = %group.id, "task group added");

    let event = Event::TaskAdded {
        task_id: group.id.clone(),
        name: group.name.clone(),
        at: now,
    };
    let mut next = profile.clone();
    next.tasks.push(group.into());
    Ok(Mutation {
        profile: next,
        events: vec![event],
    })
}

// ── Editing ──────────────────────────────────────────────────────────

/// Rename a single task.
pub fn edit_task(
    profile: &Profile,
    task_id: &str,
    name: &str,
    now: DateTime<Utc>,
) -> Result<Mutation, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName("Task"));
    }
    let Some((index, task)) = find_single(profile, task_id) else {
        return Ok(Mutation::unchanged(profile));
    };
    if task.name == name {
        return Ok(Mutation::unchanged(profile));
    }

    let mut next = profile.clone();
    if let TaskItem::Single(task) = &mut next.tasks[index] {
        task.name = name.to_string();
    }
    Ok(Mutation {
        profile: next,
        events: vec![Event::TaskRenamed {
            task_id: task_id.to_string(),
            sub_task_id: None,
            name: name.to_string(),
            at: now,
        }],
    })
}

/// Rename one sub-task of a group.
pub fn edit_sub_task(
    profile: &Profile,
    group_id: &str,
    sub_task_id: &str,
    name: &str,
    now: DateTime<Utc>,
) -> Result<Mutation, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName("Sub-task"));
    }
    let Some(index) = group_index(profile, group_id) else {
        return Ok(Mutation::unchanged(profile));
    };

    let mut next = profile.clone();
    let TaskItem::Group(group) = &mut next.tasks[index] else {
        return Ok(Mutation::unchanged(profile));
    };
    match group.sub_tasks.iter_mut().find(|s| s.id == sub_task_id) {
        Some(sub_task) if sub_task.name != name => sub_task.name = name.to_string(),
        _ => return Ok(Mutation::unchanged(profile)),
    }

    Ok(Mutation {
        profile: next,
        events: vec![Event::TaskRenamed {
            task_id: group_id.to_string(),
            sub_task_id: Some(sub_task_id.to_string()),
            name: name.to_string(),
            at: now,
        }],
    })
}

// ── Deletion ─────────────────────────────────────────────────────────

/// Remove a single task.
pub fn delete_task(profile: &Profile, task_id: &str, now: DateTime<Utc>) -> Mutation {
    match find_single(profile, task_id) {
        Some((index, _)) => remove_item(profile, index, now),
        None => Mutation::unchanged(profile),
    }
}

/// Remove a whole group, completed sub-tasks included.
pub fn delete_task_group(profile: &Profile, group_id: &str, now: DateTime<Utc>) -> Mutation {
    match group_index(profile, group_id) {
        Some(index) => remove_item(profile, index, now),
        None => Mutation::unchanged(profile),
    }
}

/// Remove one sub-task. A group left with nothing to do is removed as
/// well, without awarding anything.
pub fn delete_sub_task(
    profile: &Profile,
    group_id: &str,
    sub_task_id: &str,
    now: DateTime<Utc>,
) -> Mutation {
    let Some(index) = group_index(profile, group_id) else {
        return Mutation::unchanged(profile);
    };

    let mut next = profile.clone();
    let TaskItem::Group(group) = &mut next.tasks[index] else {
        return Mutation::unchanged(profile);
    };
    let Some(position) = group.sub_tasks.iter().position(|s| s.id == sub_task_id) else {
        return Mutation::unchanged(profile);
    };
    group.sub_tasks.remove(position);
    let finished = group.is_finished();

    let mut events = vec![Event::TaskRemoved {
        task_id: group_id.to_string(),
        sub_task_id: Some(sub_task_id.to_string()),
        at: now,
    }];
    if finished {
        next.tasks.remove(index);
        events.push(Event::TaskRemoved {
            task_id: group_id.to_string(),
            sub_task_id: None,
            at: now,
        });
    }
    tracing::debug!(profile = %next.id, group_id, sub_task_id, "sub-task deleted");

    Mutation {
        profile: next,
        events,
    }
}

fn remove_item(profile: &Profile, index: usize, now: DateTime<Utc>) -> Mutation {
    let mut next = profile.clone();
    let removed = next.tasks.remove(index);
    tracing::debug!(profile = %next.id, task_id = removed.id(), "task deleted");
    Mutation {
        profile: next,
        events: vec![Event::TaskRemoved {
            task_id: removed.id().to_string(),
            sub_task_id: None,
            at: now,
        }],
    }
}

// ── Profile settings ─────────────────────────────────────────────────

/// Replace the avatar and award AVATAR_STYLIST on first save.
pub fn save_avatar(
    profile: &Profile,
    avatar: AvatarConfig,
    options: &AvatarOptions,
    now: DateTime<Utc>,
) -> Result<Mutation, ValidationError> {
    avatar.validate(options)?;

    let mut next = profile.clone();
    next.avatar = avatar;
    let mut events = vec![Event::AvatarSaved { at: now }];
    if award_event_badge(&mut next, BadgeKind::AvatarStylist) {
        events.push(Event::BadgeAwarded {
            badge: BadgeKind::AvatarStylist,
            at: now,
        });
    }
    Ok(Mutation {
        profile: next,
        events,
    })
}

pub fn set_theme(profile: &Profile, theme: Theme, now: DateTime<Utc>) -> Mutation {
    if profile.theme == theme {
        return Mutation::unchanged(profile);
    }
    let mut next = profile.clone();
    next.theme = theme;
    Mutation {
        profile: next,
        events: vec![Event::ThemeChanged { theme, at: now }],
    }
}

// ── Lookup ───────────────────────────────────────────────────────────

fn find_single<'a>(profile: &'a Profile, task_id: &str) -> Option<(usize, &'a SingleTask)> {
    profile
        .tasks
        .iter()
        .enumerate()
        .find_map(|(index, item)| match item {
            TaskItem::Single(task) if task.id == task_id => Some((index, task)),
            _ => None,
        })
}

fn group_index(profile: &Profile, group_id: &str) -> Option<usize> {
    profile
        .tasks
        .iter()
        .position(|item| matches!(item, TaskItem::Group(group) if group.id == group_id))
}
