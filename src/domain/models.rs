//! Domain models for the task list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single to-do entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Opaque unique identifier, assigned at creation.
    pub id: String,
    /// Display text.
    pub title: String,
    /// Whether the task is done.
    #[serde(default)]
    pub completed: bool,
    /// When this todo was created. Never changes.
    pub created_at: DateTime<Utc>,
}

impl Todo {
    /// Create a fresh, incomplete todo stamped with the current time.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            completed: false,
            created_at: Utc::now(),
        }
    }

    /// Merge the provided fields. `id` and `created_at` are never touched.
    pub fn apply(&mut self, input: UpdateTodoInput) {
        if let Some(title) = input.title {
            self.title = title;
        }
        if let Some(completed) = input.completed {
            self.completed = completed;
        }
    }

    /// Flip the completed flag.
    pub const fn toggle(&mut self) {
        self.completed = !self.completed;
    }

    /// Short form of the id for display.
    #[must_use]
    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(8)
            .map_or(self.id.len(), |(i, _)| i);
        &self.id[..end]
    }
}

/// Fields accepted when creating a todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTodoInput {
    pub title: String,
}

impl CreateTodoInput {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

/// Partial update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTodoInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateTodoInput {
    /// Update only the title.
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            completed: None,
        }
    }
}
