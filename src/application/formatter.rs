//! Output formatting for todo lists.
//!
//! Supports multiple output formats: Markdown checklist, JSON, and table view.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};

use crate::domain::Todo;

/// Shown when the list has no items.
pub const EMPTY_LIST_MESSAGE: &str = "Your list is empty. Start by adding a task above!";

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Markdown checklist.
    #[default]
    Markdown,
    /// JSON format for programmatic use.
    Json,
    /// Compact table listing.
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "table" => Ok(Self::Table),
            _ => Err(format!("Unknown format: {s}. Use: markdown, json, table")),
        }
    }
}

/// Formats a single todo as a Markdown checklist line.
pub fn format_todo_markdown(todo: &Todo) -> String {
    if todo.completed {
        format!(
            "- [x] {} {}",
            todo.title.strikethrough().dimmed(),
            format!("({})", todo.short_id()).dimmed()
        )
    } else {
        format!(
            "- [ ] {} {}",
            todo.title,
            format!("({})", todo.short_id()).dimmed()
        )
    }
}

/// Formats a list of todos as a Markdown checklist.
pub fn format_todos_markdown(todos: &[Todo]) -> String {
    if todos.is_empty() {
        return EMPTY_LIST_MESSAGE.dimmed().to_string();
    }

    todos
        .iter()
        .map(format_todo_markdown)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats todos as JSON.
///
/// # Errors
/// Returns error if serialization fails.
pub fn format_todos_json(todos: &[Todo]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(todos)
}

/// Formats a table listing of todos.
pub fn format_todos_table(todos: &[Todo]) -> String {
    if todos.is_empty() {
        return EMPTY_LIST_MESSAGE.dimmed().to_string();
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Done", "Created", "Title"]);

    for todo in todos {
        table.add_row(vec![
            todo.short_id().to_string(),
            if todo.completed { "✓" } else { " " }.to_string(),
            todo.created_at.format("%Y-%m-%d %H:%M").to_string(),
            truncate(&todo.title, 50),
        ]);
    }

    table.to_string()
}

/// Formats the list in the requested format.
///
/// # Errors
/// Returns error if JSON serialization fails.
pub fn format_todos(todos: &[Todo], format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Markdown => Ok(format_todos_markdown(todos)),
        OutputFormat::Json => format_todos_json(todos),
        OutputFormat::Table => Ok(format_todos_table(todos)),
    }
}

/// Footer line: "1 item", "3 items".
pub fn format_item_count(count: usize) -> String {
    let noun = if count == 1 { "item" } else { "items" };
    format!("{count} {noun}")
}

/// Error banner shown above the list.
pub fn format_error_banner(message: &str) -> String {
    format!("{} {}", "✗".red().bold(), message.red())
}

/// Truncates a string to max length with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.lines().next().unwrap_or(s);
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
