//! Task items: single tasks and task groups.
//!
//! A profile's task list is an ordered collection of [`TaskItem`]s. Single
//! tasks may recur and may carry a deadline; groups bundle sub-tasks and are
//! removed from the list as soon as every sub-task is done.
//!
//! The persisted form is a flat JSON record discriminated by a `type` field
//! (`"single"` or `"group"`). Single tasks are decoded through an internal
//! record type so that the optional recurrence/deadline fields become proper
//! enums on the Rust side.

pub mod template;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Difficulty tag on a task; determines the experience yield.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Easy
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ValidationError::InvalidDifficulty(s.to_string())),
        }
    }
}

/// Recurrence rule governing when `last_completed` expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recurrence {
    /// One-shot task, removed on completion.
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    /// Every `days` days, counted as whole 24h periods.
    Custom { days: u32 },
}

impl Recurrence {
    /// Build a custom rule, rejecting spans shorter than one day.
    pub fn custom(days: i64) -> Result<Self, ValidationError> {
        if days < 1 {
            return Err(ValidationError::InvalidRecurrenceDays(days));
        }
        let days = u32::try_from(days).map_err(|_| ValidationError::InvalidRecurrenceDays(days))?;
        Ok(Recurrence::Custom { days })
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, Recurrence::None)
    }

    /// Interval name as written to storage; `None` for one-shot tasks.
    pub fn interval_name(&self) -> Option<&'static str> {
        match self {
            Recurrence::None => None,
            Recurrence::Daily => Some("daily"),
            Recurrence::Weekly => Some("weekly"),
            Recurrence::Monthly => Some("monthly"),
            Recurrence::Custom { .. } => Some("custom"),
        }
    }

    /// Parse an interval name; `custom_days` is required for `custom`.
    pub fn parse(interval: &str, custom_days: Option<i64>) -> Result<Self, ValidationError> {
        match interval.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Recurrence::None),
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            "monthly" => Ok(Recurrence::Monthly),
            "custom" => Recurrence::custom(custom_days.unwrap_or(0)),
            _ => Err(ValidationError::InvalidRecurrence(interval.to_string())),
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recurrence::None => write!(f, "once"),
            Recurrence::Daily => write!(f, "every day"),
            Recurrence::Weekly => write!(f, "every week"),
            Recurrence::Monthly => write!(f, "every month"),
            Recurrence::Custom { days } => write!(f, "every {} days", days),
        }
    }
}

/// Deadline descriptor of a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Deadline {
    #[default]
    None,
    /// Fixed point in time.
    At(DateTime<Utc>),
    /// Live window `[created_at, created_at + minutes)`.
    Window {
        created_at: DateTime<Utc>,
        minutes: u32,
    },
}

impl Deadline {
    /// Build a duration window, rejecting spans shorter than one minute.
    pub fn window(created_at: DateTime<Utc>, minutes: i64) -> Result<Self, ValidationError> {
        if minutes < 1 {
            return Err(ValidationError::InvalidDuration(minutes));
        }
        let minutes = u32::try_from(minutes).map_err(|_| ValidationError::InvalidDuration(minutes))?;
        Ok(Deadline::Window { created_at, minutes })
    }

    /// Total length of a duration window.
    pub fn total(&self) -> Option<Duration> {
        match self {
            Deadline::Window { minutes, .. } => Some(Duration::minutes(i64::from(*minutes))),
            _ => None,
        }
    }

    /// Instant after which the task is overdue. `None` without a deadline,
    /// or when a window ends past the last representable instant.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        match self {
            Deadline::None => None,
            Deadline::At(at) => Some(*at),
            Deadline::Window { created_at, minutes } => {
                created_at.checked_add_signed(Duration::minutes(i64::from(*minutes)))
            }
        }
    }
}

/// A standalone task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SingleTaskRecord", into = "SingleTaskRecord")]
pub struct SingleTask {
    pub id: String,
    pub name: String,
    pub difficulty: Difficulty,
    pub recurrence: Recurrence,
    pub last_completed: Option<DateTime<Utc>>,
    pub deadline: Deadline,
}

impl SingleTask {
    /// Create a one-shot task with a fresh identifier.
    pub fn new(name: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            difficulty,
            recurrence: Recurrence::None,
            last_completed: None,
            deadline: Deadline::None,
        }
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = recurrence;
        self
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_recurring()
    }
}

/// A task inside a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTask {
    pub id: String,
    pub name: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub completed: bool,
}

/// A bundle of sub-tasks shown as one list entry until fully completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sub_tasks: Vec<SubTask>,
}

impl TaskGroup {
    /// A group with no sub-tasks left to do must not stay in the list.
    pub fn is_finished(&self) -> bool {
        self.sub_tasks.iter().all(|s| s.completed)
    }

    /// (completed, total)
    pub fn progress(&self) -> (usize, usize) {
        let done = self.sub_tasks.iter().filter(|s| s.completed).count();
        (done, self.sub_tasks.len())
    }

    pub fn sub_task(&self, sub_task_id: &str) -> Option<&SubTask> {
        self.sub_tasks.iter().find(|s| s.id == sub_task_id)
    }
}

/// One entry of a profile's task list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TaskItem {
    Single(SingleTask),
    Group(TaskGroup),
}

impl TaskItem {
    pub fn id(&self) -> &str {
        match self {
            TaskItem::Single(task) => &task.id,
            TaskItem::Group(group) => &group.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TaskItem::Single(task) => &task.name,
            TaskItem::Group(group) => &group.name,
        }
    }

    pub fn as_single(&self) -> Option<&SingleTask> {
        match self {
            TaskItem::Single(task) => Some(task),
            TaskItem::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&TaskGroup> {
        match self {
            TaskItem::Single(_) => None,
            TaskItem::Group(group) => Some(group),
        }
    }
}

impl From<SingleTask> for TaskItem {
    fn from(task: SingleTask) -> Self {
        TaskItem::Single(task)
    }
}

impl From<TaskGroup> for TaskItem {
    fn from(group: TaskGroup) -> Self {
        TaskItem::Group(group)
    }
}

// ── Storage record ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
enum DeadlineKind {
    #[default]
    None,
    Datetime,
    Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SingleTaskRecord {
    id: String,
    name: String,
    difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_recurring: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recurring_interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    custom_recurring_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_completed: Option<DateTime<Utc>>,
    #[serde(default)]
    deadline_type: DeadlineKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration_minutes: Option<i64>,
}

impl TryFrom<SingleTaskRecord> for SingleTask {
    type Error = ValidationError;

    fn try_from(record: SingleTaskRecord) -> Result<Self, Self::Error> {
        let recurrence = if record.is_recurring.unwrap_or(false) {
            let interval = record
                .recurring_interval
                .as_deref()
                .ok_or_else(|| ValidationError::InvalidRecurrence(String::new()))?;
            Recurrence::parse(interval, record.custom_recurring_days)?
        } else {
            Recurrence::None
        };

        // Records written without the companion fields decode as "no deadline".
        let deadline = match record.deadline_type {
            DeadlineKind::None => Deadline::None,
            DeadlineKind::Datetime => record.deadline.map_or(Deadline::None, Deadline::At),
            DeadlineKind::Duration => match (record.created_at, record.duration_minutes) {
                (_, Some(minutes)) if minutes < 0 => {
                    return Err(ValidationError::InvalidDuration(minutes))
                }
                (Some(created_at), Some(minutes)) if minutes > 0 => {
                    Deadline::window(created_at, minutes)?
                }
                _ => Deadline::None,
            },
        };

        Ok(SingleTask {
            id: record.id,
            name: record.name,
            difficulty: record.difficulty,
            recurrence,
            last_completed: record.last_completed,
            deadline,
        })
    }
}

impl From<SingleTask> for SingleTaskRecord {
    fn from(task: SingleTask) -> Self {
        let custom_recurring_days = match task.recurrence {
            Recurrence::Custom { days } => Some(i64::from(days)),
            _ => None,
        };
        let (deadline_type, deadline, created_at, duration_minutes) = match task.deadline {
            Deadline::None => (DeadlineKind::None, None, None, None),
            Deadline::At(at) => (DeadlineKind::Datetime, Some(at), None, None),
            Deadline::Window { created_at, minutes } => (
                DeadlineKind::Duration,
                None,
                Some(created_at),
                Some(i64::from(minutes)),
            ),
        };

        SingleTaskRecord {
            id: task.id,
            name: task.name,
            difficulty: task.difficulty,
            is_recurring: task.recurrence.is_recurring().then_some(true),
            recurring_interval: task.recurrence.interval_name().map(str::to_string),
            custom_recurring_days,
            last_completed: task.last_completed,
            deadline_type,
            deadline,
            created_at,
            duration_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("Hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!(" easy ".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert!(matches!(
            "brutal".parse::<Difficulty>(),
            Err(ValidationError::InvalidDifficulty(_))
        ));
    }

    #[test]
    fn custom_recurrence_requires_positive_days() {
        assert_eq!(Recurrence::custom(3).unwrap(), Recurrence::Custom { days: 3 });
        assert_eq!(
            Recurrence::custom(0),
            Err(ValidationError::InvalidRecurrenceDays(0))
        );
        assert_eq!(
            Recurrence::parse("custom", None),
            Err(ValidationError::InvalidRecurrenceDays(0))
        );
    }

    #[test]
    fn window_rejects_non_positive_minutes() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(Deadline::window(t, -5), Err(ValidationError::InvalidDuration(-5)));
        assert_eq!(Deadline::window(t, 0), Err(ValidationError::InvalidDuration(0)));
        let window = Deadline::window(t, 90).unwrap();
        assert_eq!(window.end(), Some(t + Duration::minutes(90)));
        assert_eq!(window.total(), Some(Duration::minutes(90)));
    }

    #[test]
    fn window_ending_past_the_calendar_has_no_end() {
        let late = DateTime::<Utc>::MAX_UTC - Duration::minutes(10);
        let window = Deadline::window(late, 60).unwrap();
        assert_eq!(window.end(), None);
        assert_eq!(window.total(), Some(Duration::minutes(60)));
    }

    #[test]
    fn decodes_recurring_single_task_record() {
        let raw = json!({
            "type": "single",
            "id": "t1",
            "name": "Water plants",
            "difficulty": "medium",
            "isRecurring": true,
            "recurringInterval": "custom",
            "customRecurringDays": 3,
            "lastCompleted": "2024-01-01T10:00:00Z",
            "deadlineType": "none"
        });
        let item: TaskItem = serde_json::from_value(raw).unwrap();
        let task = item.as_single().unwrap();
        assert_eq!(task.recurrence, Recurrence::Custom { days: 3 });
        assert_eq!(task.difficulty, Difficulty::Medium);
        assert_eq!(
            task.last_completed,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn encodes_duration_deadline_as_flat_fields() {
        let created = Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 0).unwrap();
        let task = SingleTask::new("Essay", Difficulty::Hard)
            .with_deadline(Deadline::window(created, 60).unwrap());
        let value = serde_json::to_value(TaskItem::from(task)).unwrap();

        assert_eq!(value["type"], "single");
        assert_eq!(value["deadlineType"], "duration");
        assert_eq!(value["durationMinutes"], 60);
        assert_eq!(value["createdAt"], "2024-03-05T08:30:00Z");
        assert!(value.get("isRecurring").is_none());
        assert!(value.get("deadline").is_none());
    }

    #[test]
    fn incomplete_deadline_record_decodes_as_none() {
        let raw = json!({
            "type": "single",
            "id": "t2",
            "name": "Call mum",
            "difficulty": "easy",
            "deadlineType": "datetime"
        });
        let item: TaskItem = serde_json::from_value(raw).unwrap();
        assert_eq!(item.as_single().unwrap().deadline, Deadline::None);
    }

    #[test]
    fn negative_duration_record_is_rejected() {
        let raw = json!({
            "type": "single",
            "id": "t3",
            "name": "Broken",
            "difficulty": "easy",
            "deadlineType": "duration",
            "createdAt": "2024-01-01T00:00:00Z",
            "durationMinutes": -10
        });
        assert!(serde_json::from_value::<TaskItem>(raw).is_err());
    }

    #[test]
    fn malformed_difficulty_is_rejected() {
        let raw = json!({
            "type": "single",
            "id": "t4",
            "name": "Mystery",
            "difficulty": "legendary",
            "deadlineType": "none"
        });
        assert!(serde_json::from_value::<TaskItem>(raw).is_err());
    }

    #[test]
    fn decodes_group_record() {
        let raw = json!({
            "type": "group",
            "id": "g1",
            "name": "Kitchen",
            "subTasks": [
                { "id": "s1", "name": "Dishes", "difficulty": "medium", "completed": true },
                { "id": "s2", "name": "Trash", "difficulty": "easy", "completed": false }
            ]
        });
        let item: TaskItem = serde_json::from_value(raw).unwrap();
        let group = item.as_group().unwrap();
        assert_eq!(group.progress(), (1, 2));
        assert!(!group.is_finished());
        assert_eq!(item.name(), "Kitchen");
    }

    #[test]
    fn empty_group_counts_as_finished() {
        let group = TaskGroup {
            id: "g".into(),
            name: "Empty".into(),
            sub_tasks: Vec::new(),
        };
        assert!(group.is_finished());
    }
}
