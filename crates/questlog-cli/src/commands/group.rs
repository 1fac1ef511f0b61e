//! Task group commands: templates, sub-task completion and cleanup.

use clap::Subcommand;
use questlog_core::{
    builtin_templates, find_template, Action, Difficulty, Event, GroupTemplate, TemplateTask,
};

use super::{added_id, Session};

#[derive(Subcommand)]
pub enum GroupAction {
    /// List the built-in group templates
    Templates,
    /// Add a group from a built-in template (kitchen, bathroom, bedroom)
    Add {
        /// Template key
        template: String,
    },
    /// Add a custom group
    Custom {
        /// Group name
        name: String,
        /// Sub-task as "name" or "name:difficulty"; repeat for more
        #[arg(long = "task", required = true)]
        tasks: Vec<String>,
    },
    /// Complete one sub-task
    Complete {
        /// Group ID
        group_id: String,
        /// Sub-task ID
        sub_task_id: String,
    },
    /// Rename one sub-task
    Edit {
        /// Group ID
        group_id: String,
        /// Sub-task ID
        sub_task_id: String,
        /// New name
        name: String,
    },
    /// Delete a group, or one of its sub-tasks with --sub
    Delete {
        /// Group ID
        group_id: String,
        /// Sub-task ID
        #[arg(long)]
        sub: Option<String>,
    },
}

pub fn run(user: &str, action: GroupAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open(user)?;

    match action {
        GroupAction::Templates => {
            for template in builtin_templates() {
                let state = if session.engine.is_unlocked(&session.profile, template.feature) {
                    "available".to_string()
                } else {
                    format!(
                        "unlocks at level {}",
                        session.engine.config().unlocks.threshold(template.feature)
                    )
                };
                println!(
                    "{:<10} {} ({} tasks, {state})",
                    template.key.as_deref().unwrap_or_default(),
                    template.name,
                    template.tasks.len()
                );
            }
        }
        GroupAction::Add { template } => {
            let template =
                find_template(&template).ok_or_else(|| format!("unknown template: {template}"))?;
            let events = session.apply(Action::AddTaskGroup(template))?;
            print_new_group(&session, &events);
        }
        GroupAction::Custom { name, tasks } => {
            let tasks = tasks
                .iter()
                .map(|entry| parse_template_task(entry))
                .collect::<Result<Vec<_>, _>>()?;
            let events = session.apply(Action::AddTaskGroup(GroupTemplate::custom(name, tasks)))?;
            print_new_group(&session, &events);
        }
        GroupAction::Complete {
            group_id,
            sub_task_id,
        } => {
            if session.profile.group(&group_id).is_none() {
                return Err(format!("group not found: {group_id}").into());
            }
            session.apply(Action::CompleteSubTask {
                group_id,
                sub_task_id,
            })?;
        }
        GroupAction::Edit {
            group_id,
            sub_task_id,
            name,
        } => {
            session.apply(Action::EditSubTask {
                group_id,
                sub_task_id,
                name,
            })?;
        }
        GroupAction::Delete { group_id, sub } => {
            let action = match sub {
                Some(sub_task_id) => Action::DeleteSubTask {
                    group_id,
                    sub_task_id,
                },
                None => Action::DeleteTaskGroup { group_id },
            };
            session.apply(action)?;
        }
    }
    Ok(())
}

fn print_new_group(session: &Session, events: &[Event]) {
    if let Some(group) = added_id(events).and_then(|id| session.profile.group(id)) {
        println!("Group ID: {}", group.id);
        for sub_task in &group.sub_tasks {
            println!("    {}  {} [{}]", sub_task.id, sub_task.name, sub_task.difficulty);
        }
    }
}

/// `"name"` or `"name:difficulty"`.
fn parse_template_task(entry: &str) -> Result<TemplateTask, Box<dyn std::error::Error>> {
    match entry.rsplit_once(':') {
        Some((name, difficulty)) => Ok(TemplateTask::new(name.trim(), difficulty.parse::<Difficulty>()?)),
        None => Ok(TemplateTask::new(entry.trim(), Difficulty::Easy)),
    }
}
