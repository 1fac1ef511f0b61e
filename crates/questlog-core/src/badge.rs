//! Badge registry and evaluator.
//!
//! Badges come in two categories:
//!
//! - **Derivable** badges have a predicate over the profile and are awarded by
//!   [`award_new_badges`], which runs after every mutation.
//! - **Event-triggered** badges mark a moment that leaves no trace in the
//!   profile (saving an avatar, finishing a whole group). Only the mutation
//!   that causes the event awards them, through [`award_event_badge`]; the
//!   evaluator never tries to infer them.
//!
//! Awarding is monotonic: a badge, once held, is never removed or awarded
//! again.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::profile::Profile;
use crate::task::TaskItem;

/// Badge identifier as stored in the profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BadgeKind {
    Novice,
    Adept,
    Expert,
    #[serde(rename = "LEVEL_10_MASTER")]
    Level10Master,
    AvatarStylist,
    RecurringMaster,
    GroupSpecialist,
}

impl BadgeKind {
    pub fn key(&self) -> &'static str {
        match self {
            BadgeKind::Novice => "NOVICE",
            BadgeKind::Adept => "ADEPT",
            BadgeKind::Expert => "EXPERT",
            BadgeKind::Level10Master => "LEVEL_10_MASTER",
            BadgeKind::AvatarStylist => "AVATAR_STYLIST",
            BadgeKind::RecurringMaster => "RECURRING_MASTER",
            BadgeKind::GroupSpecialist => "GROUP_SPECIALIST",
        }
    }

    pub fn definition(&self) -> &'static BadgeDefinition {
        let index = match self {
            BadgeKind::Novice => 0,
            BadgeKind::Adept => 1,
            BadgeKind::Expert => 2,
            BadgeKind::Level10Master => 3,
            BadgeKind::AvatarStylist => 4,
            BadgeKind::RecurringMaster => 5,
            BadgeKind::GroupSpecialist => 6,
        };
        &BADGES[index]
    }
}

impl fmt::Display for BadgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for BadgeKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BADGES
            .iter()
            .map(|badge| badge.kind)
            .find(|kind| kind.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownBadge(s.to_string()))
    }
}

/// Event that awards an event-triggered badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeEvent {
    AvatarSaved,
    GroupCompleted,
}

/// Condition under which a badge is awarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeRule {
    /// At least this many completed tasks.
    CompletedTasks(u32),
    /// At least this level.
    Level(u32),
    /// Some recurring single task carries a completion stamp.
    RecurringCompleted,
    /// Awarded by the mutation that raises the event.
    Event(BadgeEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    Derivable,
    EventTriggered,
}

/// Static description of a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeDefinition {
    pub kind: BadgeKind,
    pub name: &'static str,
    pub description: &'static str,
    pub rule: BadgeRule,
}

impl BadgeDefinition {
    pub fn category(&self) -> BadgeCategory {
        match self.rule {
            BadgeRule::Event(_) => BadgeCategory::EventTriggered,
            _ => BadgeCategory::Derivable,
        }
    }

    /// Predicate over the profile; `None` for event-triggered badges.
    pub fn holds(&self, profile: &Profile) -> Option<bool> {
        match self.rule {
            BadgeRule::CompletedTasks(n) => Some(profile.completed_tasks_count >= n),
            BadgeRule::Level(n) => Some(profile.level >= n),
            BadgeRule::RecurringCompleted => Some(profile.tasks.iter().any(|item| match item {
                TaskItem::Single(task) => task.is_recurring() && task.last_completed.is_some(),
                TaskItem::Group(_) => false,
            })),
            BadgeRule::Event(_) => None,
        }
    }
}

/// Every badge, in display order.
pub static BADGES: [BadgeDefinition; 7] = [
    BadgeDefinition {
        kind: BadgeKind::Novice,
        name: "Novice",
        description: "Complete 10 tasks",
        rule: BadgeRule::CompletedTasks(10),
    },
    BadgeDefinition {
        kind: BadgeKind::Adept,
        name: "Adept",
        description: "Complete 50 tasks",
        rule: BadgeRule::CompletedTasks(50),
    },
    BadgeDefinition {
        kind: BadgeKind::Expert,
        name: "Expert",
        description: "Complete 100 tasks",
        rule: BadgeRule::CompletedTasks(100),
    },
    BadgeDefinition {
        kind: BadgeKind::Level10Master,
        name: "Level 10 Master",
        description: "Reach level 10",
        rule: BadgeRule::Level(10),
    },
    BadgeDefinition {
        kind: BadgeKind::AvatarStylist,
        name: "Stylist",
        description: "Customize your avatar for the first time",
        rule: BadgeRule::Event(BadgeEvent::AvatarSaved),
    },
    BadgeDefinition {
        kind: BadgeKind::RecurringMaster,
        name: "Habit Master",
        description: "Complete a recurring task",
        rule: BadgeRule::RecurringCompleted,
    },
    BadgeDefinition {
        kind: BadgeKind::GroupSpecialist,
        name: "Group Specialist",
        description: "Complete an entire task group",
        rule: BadgeRule::Event(BadgeEvent::GroupCompleted),
    },
];

/// Award every derivable badge whose condition newly holds.
///
/// Returns the updated profile and the badges awarded by this call, in
/// registry order. Running it again on its own output awards nothing.
pub fn award_new_badges(profile: &Profile) -> (Profile, Vec<BadgeKind>) {
    let newly: Vec<BadgeKind> = BADGES
        .iter()
        .filter(|badge| !profile.has_badge(badge.kind))
        .filter(|badge| badge.holds(profile) == Some(true))
        .map(|badge| badge.kind)
        .collect();

    let mut updated = profile.clone();
    for kind in &newly {
        tracing::info!(profile = %profile.id, badge = %kind, "badge awarded");
        updated.badges.insert(*kind);
    }
    (updated, newly)
}

/// Award an event-triggered badge on a snapshot being built by a mutation.
///
/// Returns `true` if the badge was not held before.
pub fn award_event_badge(profile: &mut Profile, kind: BadgeKind) -> bool {
    debug_assert_eq!(
        kind.definition().category(),
        BadgeCategory::EventTriggered,
        "derivable badges are awarded by the evaluator"
    );
    let inserted = profile.badges.insert(kind);
    if inserted {
        tracing::info!(profile = %profile.id, badge = %kind, "badge awarded");
    }
    inserted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::AvatarConfig;
    use crate::task::{Difficulty, Recurrence, SingleTask};
    use chrono::{TimeZone, Utc};

    fn profile() -> Profile {
        Profile::new(
            "uid",
            "tester",
            AvatarConfig {
                body_color: "#ff6b6b".into(),
                eyes: 0,
                mouth: 0,
            },
        )
    }

    #[test]
    fn registry_splits_categories() {
        let event: Vec<BadgeKind> = BADGES
            .iter()
            .filter(|b| b.category() == BadgeCategory::EventTriggered)
            .map(|b| b.kind)
            .collect();
        assert_eq!(event, vec![BadgeKind::AvatarStylist, BadgeKind::GroupSpecialist]);
    }

    #[test]
    fn completed_count_thresholds() {
        let mut p = profile();
        p.completed_tasks_count = 50;
        let (updated, newly) = award_new_badges(&p);
        assert_eq!(newly, vec![BadgeKind::Novice, BadgeKind::Adept]);
        assert!(updated.has_badge(BadgeKind::Adept));
        assert!(!updated.has_badge(BadgeKind::Expert));
    }

    #[test]
    fn level_badge() {
        let mut p = profile();
        p.level = 10;
        let (_, newly) = award_new_badges(&p);
        assert_eq!(newly, vec![BadgeKind::Level10Master]);
    }

    #[test]
    fn recurring_badge_needs_a_completion_stamp() {
        let mut p = profile();
        let mut task = SingleTask::new("Stretch", Difficulty::Easy).with_recurrence(Recurrence::Daily);
        p.tasks.push(task.clone().into());
        assert!(award_new_badges(&p).1.is_empty());

        task.last_completed = Some(Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap());
        p.tasks = vec![task.into()];
        assert_eq!(award_new_badges(&p).1, vec![BadgeKind::RecurringMaster]);
    }

    #[test]
    fn event_badges_are_never_inferred() {
        let mut p = profile();
        p.completed_tasks_count = 1_000;
        p.level = 99;
        let (updated, _) = award_new_badges(&p);
        assert!(!updated.has_badge(BadgeKind::AvatarStylist));
        assert!(!updated.has_badge(BadgeKind::GroupSpecialist));
    }

    #[test]
    fn evaluator_is_idempotent() {
        let mut p = profile();
        p.completed_tasks_count = 120;
        p.level = 12;
        let (once, first) = award_new_badges(&p);
        let (twice, second) = award_new_badges(&once);
        assert_eq!(first.len(), 4);
        assert!(second.is_empty());
        assert_eq!(once.badges, twice.badges);
    }

    #[test]
    fn held_badges_are_kept_even_if_condition_no_longer_holds() {
        let mut p = profile();
        p.badges.insert(BadgeKind::Novice);
        p.completed_tasks_count = 0;
        let (updated, newly) = award_new_badges(&p);
        assert!(newly.is_empty());
        assert!(updated.has_badge(BadgeKind::Novice));
    }

    #[test]
    fn event_badge_awarded_once() {
        let mut p = profile();
        assert!(award_event_badge(&mut p, BadgeKind::GroupSpecialist));
        assert!(!award_event_badge(&mut p, BadgeKind::GroupSpecialist));
        assert_eq!(p.badges.len(), 1);
    }

    #[test]
    fn definitions_line_up_with_registry() {
        for badge in &BADGES {
            assert_eq!(badge.kind.definition().kind, badge.kind);
        }
    }

    #[test]
    fn kind_parses_from_key() {
        assert_eq!("level_10_master".parse::<BadgeKind>().unwrap(), BadgeKind::Level10Master);
        assert!("SPEEDRUNNER".parse::<BadgeKind>().is_err());
        assert_eq!(BadgeKind::GroupSpecialist.definition().name, "Group Specialist");
    }
}
