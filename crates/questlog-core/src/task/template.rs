//! Group templates.
//!
//! A template is the blueprint of a [`TaskGroup`]: adding a group to a profile
//! clones the template's tasks with fresh identifiers and `completed = false`.
//! Built-in templates open up with their unlock feature; custom templates
//! require [`Feature::CustomTaskGroups`].

use serde::{Deserialize, Serialize};

use super::{Difficulty, SubTask, TaskGroup};
use crate::error::ValidationError;
use crate::unlock::Feature;

/// A task inside a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateTask {
    pub name: String,
    pub difficulty: Difficulty,
}

impl TemplateTask {
    pub fn new(name: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            name: name.into(),
            difficulty,
        }
    }
}

/// Blueprint for a task group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTemplate {
    /// Lookup key (`kitchen`, `bathroom`, ...); `None` for custom templates.
    pub key: Option<String>,
    pub name: String,
    /// Feature that must be unlocked before the template can be used.
    pub feature: Feature,
    pub tasks: Vec<TemplateTask>,
}

impl GroupTemplate {
    /// A user-defined template.
    pub fn custom(name: impl Into<String>, tasks: Vec<TemplateTask>) -> Self {
        Self {
            key: None,
            name: name.into(),
            feature: Feature::CustomTaskGroups,
            tasks,
        }
    }

    /// Build a fresh group from this template.
    ///
    /// Fails when the template has no tasks, or any name is blank, since an
    /// empty group would be removed as soon as it was added.
    pub fn instantiate(&self) -> Result<TaskGroup, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName("Task group"));
        }
        if self.tasks.is_empty() {
            return Err(ValidationError::EmptyGroup(name.to_string()));
        }

        let sub_tasks = self
            .tasks
            .iter()
            .map(|task| {
                let task_name = task.name.trim();
                if task_name.is_empty() {
                    return Err(ValidationError::EmptyName("Sub-task"));
                }
                Ok(SubTask {
                    id: uuid::Uuid::new_v4().to_string(),
                    name: task_name.to_string(),
                    difficulty: task.difficulty,
                    completed: false,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TaskGroup {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            sub_tasks,
        })
    }
}

fn builtin(key: &str, name: &str, feature: Feature, tasks: &[(&str, Difficulty)]) -> GroupTemplate {
    GroupTemplate {
        key: Some(key.to_string()),
        name: name.to_string(),
        feature,
        tasks: tasks
            .iter()
            .map(|(name, difficulty)| TemplateTask::new(*name, *difficulty))
            .collect(),
    }
}

/// The stock cleanup templates.
pub fn builtin_templates() -> Vec<GroupTemplate> {
    use Difficulty::{Easy, Hard, Medium};

    vec![
        builtin(
            "kitchen",
            "Kitchen cleanup",
            Feature::TaskGroupKitchen,
            &[
                ("Wash the dishes", Medium),
                ("Wipe the counters", Easy),
                ("Take out the trash", Easy),
                ("Sweep the floor", Medium),
            ],
        ),
        builtin(
            "bathroom",
            "Bathroom cleanup",
            Feature::TaskGroupBathroom,
            &[
                ("Clean the sink", Easy),
                ("Scrub the toilet", Medium),
                ("Wash the shower or bath", Hard),
                ("Polish the mirror", Easy),
            ],
        ),
        builtin(
            "bedroom",
            "Bedroom cleanup",
            Feature::TaskGroupBedroom,
            &[
                ("Make the bed", Easy),
                ("Dust the furniture", Medium),
                ("Sort the clothes", Medium),
                ("Vacuum the floor", Medium),
            ],
        ),
    ]
}

/// Find a built-in template by key.
pub fn find_template(key: &str) -> Option<GroupTemplate> {
    builtin_templates()
        .into_iter()
        .find(|template| template.key.as_deref() == Some(key))
}
