//! Application layer - use cases and orchestration.
//!
//! Defines the todo service contract, its storage-backed implementation,
//! the state hook that drives presentation, and output formatting.

pub mod formatter;
pub mod service;
pub mod storage_service;
pub mod todo_hook;

pub use formatter::{
    format_error_banner, format_item_count, format_todo_markdown, format_todos, OutputFormat,
};
pub use service::TodoService;
pub use storage_service::StorageTodoService;
pub use todo_hook::{TodoHook, TodoState};
