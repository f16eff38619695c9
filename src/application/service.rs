//! Data-access contract for todos.
//!
//! Any implementation (storage-backed, remote, test fake) can sit behind
//! [`TodoService`] without changing the hook that consumes it.

use async_trait::async_trait;

use crate::domain::{CreateTodoInput, Result, Todo, UpdateTodoInput};

/// Asynchronous CRUD operations over the todo collection.
///
/// Absence is never an error: lookups and mutations on an unknown id return
/// `None` or `false`. Only failures of the underlying medium surface as `Err`.
#[async_trait]
pub trait TodoService: Send + Sync {
    /// All todos in insertion order.
    async fn get_all(&self) -> Result<Vec<Todo>>;

    /// The todo with `id`, if any.
    async fn get_by_id(&self, id: &str) -> Result<Option<Todo>>;

    /// Append a new incomplete todo and return it.
    async fn create(&self, input: CreateTodoInput) -> Result<Todo>;

    /// Merge `input` into the todo with `id` and return the result.
    async fn update(&self, id: &str, input: UpdateTodoInput) -> Result<Option<Todo>>;

    /// Remove the todo with `id`. Returns whether anything was removed.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Flip the completed flag of the todo with `id` and return it.
    async fn toggle_complete(&self, id: &str) -> Result<Option<Todo>>;
}
