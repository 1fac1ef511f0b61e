//! Task management commands for CLI.

use std::time::Duration as StdDuration;

use chrono::{DateTime, Local, Utc};
use clap::Subcommand;
use questlog_core::availability::next_available_at;
use questlog_core::{
    format_remaining, Action, DeadlineRequest, DeadlineStatus, Difficulty, Engine, Feature,
    NewTask, Recurrence, Severity, SingleTask, TaskItem,
};
use tokio::time::MissedTickBehavior;

use super::{added_id, Session};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a single task
    Add {
        /// Task name
        name: String,
        /// easy, medium or hard
        #[arg(long, default_value = "easy")]
        difficulty: String,
        /// Repeat: daily, weekly, monthly or custom
        #[arg(long)]
        every: Option<String>,
        /// Day count for --every custom
        #[arg(long)]
        days: Option<i64>,
        /// Fixed deadline (RFC 3339, e.g. 2024-05-01T18:00:00Z)
        #[arg(long, conflicts_with = "minutes")]
        due: Option<String>,
        /// Time limit in minutes, starting now
        #[arg(long)]
        minutes: Option<i64>,
    },
    /// List tasks and groups
    List {
        /// Print the task list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Complete a single task
    Complete {
        /// Task ID
        id: String,
    },
    /// Rename a single task
    Edit {
        /// Task ID
        id: String,
        /// New name
        name: String,
    },
    /// Delete a single task
    Delete {
        /// Task ID
        id: String,
    },
    /// Count down a task's deadline until it runs out (Ctrl-C stops)
    Watch {
        /// Task ID
        id: String,
        /// Seconds between updates
        #[arg(long, default_value = "1")]
        interval: u64,
        /// Print the current status once and exit
        #[arg(long)]
        once: bool,
    },
}

pub fn run(user: &str, action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open(user)?;

    match action {
        TaskAction::Add {
            name,
            difficulty,
            every,
            days,
            due,
            minutes,
        } => {
            let difficulty: Difficulty = difficulty.parse()?;
            let recurrence = match every {
                Some(interval) => Recurrence::parse(&interval, days)?,
                None => Recurrence::None,
            };
            let deadline = match (due, minutes) {
                (Some(due), _) => DeadlineRequest::At(
                    DateTime::parse_from_rfc3339(&due)
                        .map_err(|e| format!("invalid --due '{due}': {e}"))?
                        .with_timezone(&Utc),
                ),
                (None, Some(minutes)) => DeadlineRequest::Minutes(minutes),
                (None, None) => DeadlineRequest::None,
            };
            let request = NewTask::new(name, difficulty)
                .with_recurrence(recurrence)
                .with_deadline(deadline);
            let events = session.apply(Action::AddTask(request))?;
            if let Some(id) = added_id(&events) {
                println!("Task ID: {id}");
            }
        }
        TaskAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&session.profile.tasks)?);
            } else {
                list(&session, Local::now());
            }
        }
        TaskAction::Complete { id } => {
            let now = Local::now();
            let task = session
                .profile
                .single_task(&id)
                .ok_or_else(|| format!("task not found: {id}"))?;
            if !session.engine.is_available_in(task, &now) {
                match next_available_at(task, &now) {
                    Some(next) => println!(
                        "'{}' is already done; available again {}",
                        task.name,
                        next.format("%Y-%m-%d %H:%M")
                    ),
                    None => println!("'{}' is already done", task.name),
                }
                return Ok(());
            }
            session.apply(Action::CompleteTask { task_id: id })?;
        }
        TaskAction::Edit { id, name } => {
            session.apply(Action::EditTask { task_id: id, name })?;
        }
        TaskAction::Delete { id } => {
            session.apply(Action::DeleteTask { task_id: id })?;
        }
        TaskAction::Watch { id, interval, once } => {
            session.require(Feature::TaskTimeLimit)?;
            let task = session
                .profile
                .single_task(&id)
                .ok_or_else(|| format!("task not found: {id}"))?
                .clone();
            if matches!(
                session.engine.deadline_status(&task, Utc::now()),
                DeadlineStatus::NotApplicable
            ) {
                return Err(format!("task '{}' has no deadline", task.name).into());
            }
            if once {
                println!("{}", status_line(&session.engine, &task, Utc::now()));
                return Ok(());
            }

            let notify = session.engine.is_unlocked(&session.profile, Feature::TaskTimeNotifications);
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(countdown(
                session.engine.clone(),
                task,
                StdDuration::from_secs(interval.max(1)),
                notify,
            ));
        }
    }
    Ok(())
}

fn list(session: &Session, now: DateTime<Local>) {
    let engine = &session.engine;
    let utc_now = now.with_timezone(&Utc);
    if session.profile.tasks.is_empty() {
        println!("No tasks. Add one with `questlog task add <name>`.");
        return;
    }

    for item in &session.profile.tasks {
        match item {
            TaskItem::Single(task) => {
                let mut line = format!("{}  {} [{}]", task.id, task.name, task.difficulty);
                if task.is_recurring() {
                    line.push_str(&format!(" ({})", task.recurrence));
                    if let Some(next) = next_available_at(task, &now) {
                        line.push_str(&format!(" done, back {}", next.format("%Y-%m-%d %H:%M")));
                    }
                }
                match engine.deadline_status(task, utc_now) {
                    DeadlineStatus::NotApplicable => {}
                    _ => line.push_str(&format!(" {}", status_line(engine, task, utc_now))),
                }
                println!("{line}");
            }
            TaskItem::Group(group) => {
                let (done, total) = group.progress();
                println!("{}  {} ({done}/{total})", group.id, group.name);
                for sub_task in &group.sub_tasks {
                    let mark = if sub_task.completed { "x" } else { " " };
                    println!(
                        "    [{mark}] {}  {} [{}]",
                        sub_task.id, sub_task.name, sub_task.difficulty
                    );
                }
            }
        }
    }
}

fn status_line(engine: &Engine, task: &SingleTask, now: DateTime<Utc>) -> String {
    match engine.deadline_status(task, now) {
        DeadlineStatus::NotApplicable => String::new(),
        DeadlineStatus::Overdue => "time's up".to_string(),
        DeadlineStatus::TimeLeft {
            remaining,
            severity: Severity::Critical,
        } => format!("{} left (!)", format_remaining(remaining)),
        DeadlineStatus::TimeLeft { remaining, .. } => {
            format!("{} left", format_remaining(remaining))
        }
    }
}

/// Re-evaluates the deadline on every tick. Wall-clock based, so a delayed
/// tick only delays the display.
async fn countdown(engine: Engine, task: SingleTask, period: StdDuration, notify: bool) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut last_severity = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Utc::now();
                let status = engine.deadline_status(&task, now);
                if notify
                    && status.severity() == Some(Severity::Critical)
                    && last_severity != Some(Severity::Critical)
                {
                    println!("Hurry up! '{}' is running out of time.", task.name);
                }
                println!("{}: {}", task.name, status_line(&engine, &task, now));
                if !matches!(status, DeadlineStatus::TimeLeft { .. }) {
                    tracing::info!(task_id = %task.id, "countdown finished");
                    break;
                }
                last_severity = status.severity();
            }
            _ = &mut ctrl_c => {
                println!("Stopped.");
                break;
            }
        }
    }
}
