//! Domain layer - core types and errors.
//!
//! This layer contains pure domain models and error types
//! without any external dependencies (DB, IO, etc.).

pub mod config;
pub mod error;
pub mod models;

pub use config::{AppConfig, StorageBackend};
pub use error::{AppError, Result};
pub use models::{CreateTodoInput, Todo, UpdateTodoInput};
