//! # Questlog Core Library
//!
//! Progression and unlock engine for the Questlog gamified task tracker.
//! Users complete tasks to earn experience, level up, unlock features and
//! collect badges. The library is pure: it consumes a [`Profile`] snapshot
//! and returns the next one, leaving storage and presentation to the caller
//! (the `questlog` CLI).
//!
//! ## Architecture
//!
//! - **Availability**: when a recurring task may be completed again
//! - **Deadline**: remaining time and severity for timed tasks
//! - **Progression**: experience per difficulty, curve and level-ups
//! - **Unlock**: level thresholds gating features
//! - **Badge**: derivable and event-triggered achievements
//! - **Mutation**: create, complete, edit and delete task items
//! - **Engine**: runs an [`Action`] through mutation and badge evaluation
//!
//! ## Key Components
//!
//! - [`Engine`]: entry point bound to an [`EngineConfig`]
//! - [`Profile`]: the persisted player state
//! - [`TaskItem`]: single task or task group
//! - [`Event`]: what an action changed

pub mod availability;
pub mod badge;
pub mod config;
pub mod deadline;
pub mod engine;
pub mod error;
pub mod events;
pub mod mutation;
pub mod profile;
pub mod progression;
pub mod task;
pub mod unlock;

pub use badge::{award_new_badges, BadgeCategory, BadgeDefinition, BadgeKind, BADGES};
pub use config::{AvatarOptions, DeadlineConfig, EngineConfig, ExperienceConfig};
pub use deadline::{format_remaining, DeadlineStatus, Severity};
pub use engine::{Action, Engine, Outcome};
pub use error::{ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use mutation::{DeadlineRequest, Mutation, NewTask};
pub use profile::{AvatarConfig, Profile, Theme};
pub use progression::{ExpProgress, ExperienceCurve, Progression};
pub use task::template::{builtin_templates, find_template, GroupTemplate, TemplateTask};
pub use task::{Deadline, Difficulty, Recurrence, SingleTask, SubTask, TaskGroup, TaskItem};
pub use unlock::{Feature, Reward, UnlockTable};
