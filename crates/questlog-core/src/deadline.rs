//! Deadline tracking.
//!
//! Status is derived from wall-clock time on every call; nothing here owns a
//! timer. Callers that show a countdown re-evaluate at whatever cadence they
//! like, and a missed tick only delays the display.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::config::DeadlineConfig;
use crate::task::{Deadline, SingleTask};

/// Presentation hint for a running deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Normal,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineStatus {
    /// The task has no deadline.
    NotApplicable,
    TimeLeft {
        remaining: Duration,
        severity: Severity,
    },
    Overdue,
}

impl DeadlineStatus {
    pub fn is_overdue(&self) -> bool {
        matches!(self, DeadlineStatus::Overdue)
    }

    pub fn severity(&self) -> Option<Severity> {
        match self {
            DeadlineStatus::TimeLeft { severity, .. } => Some(*severity),
            _ => None,
        }
    }
}

/// Remaining time for `task` at `now`.
///
/// - Fixed deadline: overdue strictly after the deadline instant; critical
///   when fewer than `critical_days` days remain.
/// - Duration window: overdue from the window end on; critical when less than
///   `critical_fraction` of the window remains.
pub fn remaining(task: &SingleTask, now: DateTime<Utc>, config: &DeadlineConfig) -> DeadlineStatus {
    match task.deadline {
        Deadline::None => DeadlineStatus::NotApplicable,
        Deadline::At(deadline) => {
            if now > deadline {
                return DeadlineStatus::Overdue;
            }
            let remaining = deadline - now;
            let severity = if remaining < Duration::days(i64::from(config.critical_days)) {
                Severity::Critical
            } else {
                Severity::Normal
            };
            DeadlineStatus::TimeLeft { remaining, severity }
        }
        Deadline::Window { created_at, minutes } => {
            let total = Duration::minutes(i64::from(minutes));
            let remaining = total - (now - created_at);
            if remaining <= Duration::zero() {
                return DeadlineStatus::Overdue;
            }
            let threshold = total.num_milliseconds() as f64 * config.critical_fraction;
            let severity = if (remaining.num_milliseconds() as f64) < threshold {
                Severity::Critical
            } else {
                Severity::Normal
            };
            DeadlineStatus::TimeLeft { remaining, severity }
        }
    }
}

/// `HH:MM:SS`, hours unbounded. Negative durations render as zero.
pub fn format_remaining(remaining: Duration) -> String {
    let total_seconds = remaining.num_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Difficulty;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn windowed(minutes: i64) -> SingleTask {
        SingleTask::new("Sprint", Difficulty::Medium)
            .with_deadline(Deadline::window(t0(), minutes).unwrap())
    }

    #[test]
    fn no_deadline_is_not_applicable() {
        let task = SingleTask::new("Chill", Difficulty::Easy);
        assert_eq!(
            remaining(&task, t0(), &DeadlineConfig::default()),
            DeadlineStatus::NotApplicable
        );
    }

    #[test]
    fn duration_window_countdown() {
        let cfg = DeadlineConfig::default();
        let task = windowed(60);

        assert_eq!(
            remaining(&task, t0() + Duration::minutes(30), &cfg),
            DeadlineStatus::TimeLeft {
                remaining: Duration::minutes(30),
                severity: Severity::Normal
            }
        );
        assert_eq!(
            remaining(&task, t0() + Duration::minutes(46), &cfg),
            DeadlineStatus::TimeLeft {
                remaining: Duration::minutes(14),
                severity: Severity::Critical
            }
        );
        assert_eq!(
            remaining(&task, t0() + Duration::minutes(59), &cfg).severity(),
            Some(Severity::Critical)
        );
        assert!(remaining(&task, t0() + Duration::minutes(60), &cfg).is_overdue());
    }

    #[test]
    fn quarter_boundary_is_not_yet_critical() {
        let cfg = DeadlineConfig::default();
        let task = windowed(60);
        assert_eq!(
            remaining(&task, t0() + Duration::minutes(45), &cfg).severity(),
            Some(Severity::Normal)
        );
    }

    #[test]
    fn fixed_deadline_tiers() {
        let cfg = DeadlineConfig::default();
        let due = t0() + Duration::days(10);
        let task = SingleTask::new("Taxes", Difficulty::Hard).with_deadline(Deadline::At(due));

        assert_eq!(
            remaining(&task, due - Duration::days(4), &cfg).severity(),
            Some(Severity::Normal)
        );
        assert_eq!(
            remaining(&task, due - Duration::days(2), &cfg).severity(),
            Some(Severity::Critical)
        );
        assert_eq!(
            remaining(&task, due, &cfg),
            DeadlineStatus::TimeLeft {
                remaining: Duration::zero(),
                severity: Severity::Critical
            }
        );
        assert!(remaining(&task, due + Duration::seconds(1), &cfg).is_overdue());
    }

    #[test]
    fn thresholds_come_from_config() {
        let cfg = DeadlineConfig {
            critical_days: 1,
            critical_fraction: 0.5,
        };
        let task = windowed(60);
        assert_eq!(
            remaining(&task, t0() + Duration::minutes(31), &cfg).severity(),
            Some(Severity::Critical)
        );

        let due = t0() + Duration::days(10);
        let fixed = SingleTask::new("Taxes", Difficulty::Hard).with_deadline(Deadline::At(due));
        assert_eq!(
            remaining(&fixed, due - Duration::days(2), &cfg).severity(),
            Some(Severity::Normal)
        );
    }

    #[test]
    fn window_near_the_end_of_time_still_counts_down() {
        let late = DateTime::<Utc>::MAX_UTC - Duration::minutes(10);
        let task = SingleTask::new("Last call", Difficulty::Easy)
            .with_deadline(Deadline::Window {
                created_at: late,
                minutes: u32::MAX,
            });
        assert_eq!(
            remaining(&task, late + Duration::minutes(5), &DeadlineConfig::default()),
            DeadlineStatus::TimeLeft {
                remaining: Duration::minutes(i64::from(u32::MAX) - 5),
                severity: Severity::Normal,
            }
        );
    }

    #[test]
    fn formats_hours_minutes_seconds() {
        assert_eq!(format_remaining(Duration::seconds(3_725)), "01:02:05");
        assert_eq!(format_remaining(Duration::hours(49)), "49:00:00");
        assert_eq!(format_remaining(Duration::seconds(-5)), "00:00:00");
    }
}
