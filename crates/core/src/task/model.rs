//! Task model definitions

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Completion-based view over a task list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFilter {
    All,
    Completed,
    Pending,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self::All
    }
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.completed,
            Self::Pending => !task.completed,
        }
    }
}

impl FromStr for TaskFilter {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "completed" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            _ => Err(Error::Validation(format!(
                "Unsupported filter '{}'",
                value
            ))),
        }
    }
}

/// A user-owned to-do item
///
/// Serialized as camelCase JSON to match the stored record shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub completed: bool,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a task owned by the given user
    pub fn new(user_id: impl Into<String>, draft: TaskDraft) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            description: draft.description,
            due_date: draft.due_date,
            completed: draft.completed,
            user_id: user_id.into(),
            created_at: Utc::now(),
        }
    }

    /// Merge present patch fields into this task.
    ///
    /// `id`, `user_id`, and `created_at` cannot be patched.
    pub(crate) fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
    }
}

/// Fields supplied when creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub completed: bool,
}

impl TaskDraft {
    /// Create a draft with the given title and due date
    pub fn new(title: impl Into<String>, due_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            due_date,
            completed: false,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the initial completion flag
    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }
}

/// Partial update for an existing task; absent fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub completed: Option<bool>,
}
