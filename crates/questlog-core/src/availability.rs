//! Recurring-task availability.
//!
//! A recurring task that has been completed becomes available again
//! according to its rule:
//!
//! | rule      | unavailable while                                  |
//! |-----------|----------------------------------------------------|
//! | daily     | same calendar day as the last completion           |
//! | weekly    | same Sunday-aligned calendar week                  |
//! | monthly   | same calendar year and month                       |
//! | custom(N) | fewer than N whole 24h periods since completion    |
//!
//! Daily, weekly and monthly compare calendar periods in the time zone of
//! `now`; custom counts elapsed time. The asymmetry is intentional.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

use crate::task::{Recurrence, SingleTask};

/// Whether `task` may be completed at `now` (UTC calendar).
pub fn is_available(task: &SingleTask, now: DateTime<Utc>) -> bool {
    is_available_in(task, &now)
}

/// Whether `task` may be completed at `now`, using the calendar of `now`'s zone.
pub fn is_available_in<Tz: TimeZone>(task: &SingleTask, now: &DateTime<Tz>) -> bool {
    let Some(last) = task.last_completed else {
        return true;
    };
    let last = last.with_timezone(&now.timezone());

    match task.recurrence {
        Recurrence::None => true,
        Recurrence::Daily => last.date_naive() < now.date_naive(),
        Recurrence::Weekly => week_start(last.date_naive()) < week_start(now.date_naive()),
        Recurrence::Monthly => (last.year(), last.month()) < (now.year(), now.month()),
        Recurrence::Custom { days } => {
            whole_days_between(&last, now) >= i64::from(days)
        }
    }
}

/// When an unavailable task opens again; `None` if it is available at `now`
/// or the opening lies past the last representable instant.
pub fn next_available_at<Tz: TimeZone>(task: &SingleTask, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    if is_available_in(task, now) {
        return None;
    }
    let tz = now.timezone();
    let last = task.last_completed?.with_timezone(&tz);

    let opens_on = match task.recurrence {
        Recurrence::None => return None,
        Recurrence::Daily => last.date_naive().succ_opt()?,
        Recurrence::Weekly => week_start(last.date_naive()).checked_add_signed(Duration::days(7))?,
        Recurrence::Monthly => first_of_next_month(last.date_naive())?,
        Recurrence::Custom { days } => {
            return last.checked_add_signed(Duration::days(i64::from(days)));
        }
    };
    tz.from_local_datetime(&opens_on.and_hms_opt(0, 0, 0)?).earliest()
}

/// Sunday starting the week that contains `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

fn first_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    }
}

/// floor(|b - a| / 24h)
fn whole_days_between<Tz: TimeZone>(a: &DateTime<Tz>, b: &DateTime<Tz>) -> i64 {
    (b.clone() - a.clone()).num_days().abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Difficulty;
    use chrono::FixedOffset;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn completed(recurrence: Recurrence, last: &str) -> SingleTask {
        let mut task = SingleTask::new("Habit", Difficulty::Easy).with_recurrence(recurrence);
        task.last_completed = Some(at(last));
        task
    }

    #[test]
    fn non_recurring_is_always_available() {
        let mut task = SingleTask::new("Once", Difficulty::Easy);
        task.last_completed = Some(at("2024-01-01T10:00:00Z"));
        assert!(is_available(&task, at("2024-01-01T10:00:01Z")));
        assert!(is_available(&task, at("1999-01-01T00:00:00Z")));
    }

    #[test]
    fn never_completed_is_available() {
        let task = SingleTask::new("Fresh", Difficulty::Easy).with_recurrence(Recurrence::Daily);
        assert!(is_available(&task, at("2024-01-01T00:00:00Z")));
    }

    #[test]
    fn daily_opens_at_midnight() {
        let task = completed(Recurrence::Daily, "2024-01-01T23:59:00Z");
        assert!(!is_available(&task, at("2024-01-01T23:59:30Z")));
        assert!(is_available(&task, at("2024-01-02T00:00:01Z")));
        assert_eq!(
            next_available_at(&task, &at("2024-01-01T23:59:30Z")),
            Some(at("2024-01-02T00:00:00Z"))
        );
    }

    #[test]
    fn daily_uses_the_calendar_of_now() {
        let task = completed(Recurrence::Daily, "2024-01-01T23:30:00Z");
        let now = at("2024-01-02T00:30:00Z");
        assert!(is_available(&task, now));

        // Both instants fall on Jan 1st two hours west of UTC.
        let west = FixedOffset::west_opt(2 * 3600).unwrap();
        assert!(!is_available_in(&task, &now.with_timezone(&west)));
    }

    #[test]
    fn weekly_weeks_start_on_sunday() {
        // 2024-01-06 is a Saturday, 2024-01-07 a Sunday.
        let task = completed(Recurrence::Weekly, "2024-01-06T12:00:00Z");
        assert!(!is_available(&task, at("2024-01-06T20:00:00Z")));
        assert!(is_available(&task, at("2024-01-07T00:00:00Z")));

        let task = completed(Recurrence::Weekly, "2024-01-07T09:00:00Z");
        assert!(!is_available(&task, at("2024-01-13T23:59:59Z")));
        assert!(is_available(&task, at("2024-01-14T00:00:00Z")));
        assert_eq!(
            next_available_at(&task, &at("2024-01-10T00:00:00Z")),
            Some(at("2024-01-14T00:00:00Z"))
        );
    }

    #[test]
    fn monthly_compares_year_and_month() {
        let task = completed(Recurrence::Monthly, "2024-01-01T00:00:00Z");
        assert!(!is_available(&task, at("2024-01-31T23:59:59Z")));
        assert!(is_available(&task, at("2024-02-01T00:00:00Z")));

        let task = completed(Recurrence::Monthly, "2023-12-31T22:00:00Z");
        assert!(is_available(&task, at("2024-01-01T00:00:00Z")));
        assert_eq!(
            next_available_at(&task, &at("2023-12-31T23:00:00Z")),
            Some(at("2024-01-01T00:00:00Z"))
        );
    }

    #[test]
    fn custom_counts_whole_elapsed_days() {
        let task = completed(Recurrence::Custom { days: 3 }, "2024-01-01T10:00:00Z");
        let t = at("2024-01-01T10:00:00Z");
        assert!(!is_available(&task, t + Duration::days(2) + Duration::hours(23)));
        assert!(is_available(&task, t + Duration::days(3)));
        assert_eq!(
            next_available_at(&task, &(t + Duration::days(1))),
            Some(t + Duration::days(3))
        );
    }

    #[test]
    fn custom_ignores_calendar_boundaries() {
        // Crosses two midnights but only ~1 elapsed day.
        let task = completed(Recurrence::Custom { days: 2 }, "2024-01-01T23:00:00Z");
        assert!(!is_available(&task, at("2024-01-03T01:00:00Z")));
        assert!(is_available(&task, at("2024-01-03T23:00:00Z")));
    }

    #[test]
    fn custom_interval_past_the_calendar_has_no_opening() {
        let task = completed(Recurrence::Custom { days: 100_000_000 }, "2024-01-01T10:00:00Z");
        let now = at("2024-01-01T11:00:00Z");
        assert!(!is_available(&task, now));
        assert_eq!(next_available_at(&task, &now), None);

        let task = completed(Recurrence::Custom { days: u32::MAX }, "2024-01-01T10:00:00Z");
        assert!(!is_available(&task, now));
        assert_eq!(next_available_at(&task, &now), None);
    }

    #[test]
    fn available_task_has_no_next_opening() {
        let task = completed(Recurrence::Daily, "2024-01-01T08:00:00Z");
        assert_eq!(next_available_at(&task, &at("2024-01-03T08:00:00Z")), None);
    }
}
