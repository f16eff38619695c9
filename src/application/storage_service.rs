//! Todo service persisted in a key-value storage medium.
//!
//! The whole collection lives as one JSON array under [`STORAGE_KEY`].
//! Every mutation reads the full array, changes it, and writes it back.
//! There is no locking, so concurrent mutations are last-writer-wins.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::service::TodoService;
use crate::domain::{AppError, CreateTodoInput, Result, Todo, UpdateTodoInput};
use crate::infrastructure::KeyValueStorage;

/// Storage slot holding the serialized collection. Bump the suffix on schema changes.
pub const STORAGE_KEY: &str = "tasklist:todos:v1";

const ID_SUFFIX_LEN: usize = 7;

/// [`TodoService`] over a [`KeyValueStorage`] with simulated latency.
pub struct StorageTodoService {
    storage: Arc<dyn KeyValueStorage>,
    simulated_delay: Duration,
}

impl StorageTodoService {
    /// Create a service with the given latency. Zero disables the wait.
    #[must_use]
    pub fn with_delay(storage: Arc<dyn KeyValueStorage>, simulated_delay: Duration) -> Self {
        Self {
            storage,
            simulated_delay,
        }
    }

    async fn delay(&self) {
        if !self.simulated_delay.is_zero() {
            tokio::time::sleep(self.simulated_delay).await;
        }
    }

    /// Missing or unreadable slots yield an empty collection.
    fn read_from_storage(&self) -> Vec<Todo> {
        let raw = match self.storage.get_item(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read todos, treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Todo>>(&raw) {
            Ok(todos) => todos,
            Err(e) => {
                tracing::warn!(error = %e, key = STORAGE_KEY, "Corrupt todo slot, treating as empty");
                Vec::new()
            }
        }
    }

    fn write_to_storage(&self, todos: &[Todo]) -> Result<()> {
        let raw = serde_json::to_string(todos).map_err(AppError::json_parse)?;
        self.storage.set_item(STORAGE_KEY, &raw)
    }

    /// Remove every todo by dropping the storage slot.
    ///
    /// # Errors
    /// Returns error if the slot cannot be removed.
    pub async fn clear(&self) -> Result<()> {
        self.delay().await;
        self.storage.remove_item(STORAGE_KEY)?;
        tracing::info!(key = STORAGE_KEY, "Cleared todos");
        Ok(())
    }
}

/// `<unix-millis>-<random suffix>`, unique with overwhelming probability.
fn generate_id() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        &random[..ID_SUFFIX_LEN]
    )
}

#[async_trait]
impl TodoService for StorageTodoService {
    async fn get_all(&self) -> Result<Vec<Todo>> {
        self.delay().await;
        Ok(self.read_from_storage())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Todo>> {
        self.delay().await;
        Ok(self.read_from_storage().into_iter().find(|t| t.id == id))
    }

    async fn create(&self, input: CreateTodoInput) -> Result<Todo> {
        self.delay().await;
        let mut todos = self.read_from_storage();

        let todo = Todo::new(generate_id(), input.title);
        todos.push(todo.clone());
        self.write_to_storage(&todos)?;

        tracing::debug!(id = %todo.id, total = todos.len(), "Created todo");
        Ok(todo)
    }

    async fn update(&self, id: &str, input: UpdateTodoInput) -> Result<Option<Todo>> {
        self.delay().await;
        let mut todos = self.read_from_storage();

        let Some(todo) = todos.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        todo.apply(input);
        let updated = todo.clone();

        self.write_to_storage(&todos)?;
        tracing::debug!(id, "Updated todo");
        Ok(Some(updated))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.delay().await;
        let mut todos = self.read_from_storage();
        let initial_len = todos.len();

        todos.retain(|t| t.id != id);
        if todos.len() == initial_len {
            return Ok(false);
        }

        self.write_to_storage(&todos)?;
        tracing::debug!(id, remaining = todos.len(), "Deleted todo");
        Ok(true)
    }

    async fn toggle_complete(&self, id: &str) -> Result<Option<Todo>> {
        self.delay().await;
        let mut todos = self.read_from_storage();

        let Some(todo) = todos.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        todo.toggle();
        let toggled = todo.clone();

        self.write_to_storage(&todos)?;
        tracing::debug!(id, completed = toggled.completed, "Toggled todo");
        Ok(Some(toggled))
    }
}
