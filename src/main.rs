//! Tasklist - a small persistent to-do list for the terminal.
//!
//! Todos are stored as one JSON array in a local key-value store and
//! survive between runs.
//!
//!   tasklist add Buy milk         # Add a todo
//!   tasklist list                 # Show the checklist
//!   tasklist toggle 1718          # Mark done/undone by id prefix
//!   tasklist edit 1718 Buy oat milk
//!   tasklist delete 1718
//!   tasklist clear --yes          # Remove every todo

mod application;
mod cli;
mod domain;
mod infrastructure;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{
    format_error_banner, format_item_count, format_todo_markdown, format_todos, OutputFormat,
    StorageTodoService, TodoHook, TodoService, TodoState,
};
use cli::{normalize_title, Cli, Commands};
use domain::{AppConfig, AppError, StorageBackend, Todo, UpdateTodoInput};
use infrastructure::{KeyValueStorage, LocalStorage, MemoryStorage};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main application logic.
async fn run(cli: Cli) -> domain::Result<()> {
    let format = cli
        .output_format()
        .map_err(|e| AppError::Config { message: e })?;

    let overrides = RunOverrides {
        data_dir: cli.data_dir,
        delay_ms: cli.delay_ms,
    };
    let config = overrides.apply(infrastructure::load_config()?);

    match cli.command {
        Commands::List => {
            let hook = mount_loaded(open_service(&config)?).await;
            print_state(&hook.state(), format)?;
            hook.dispose();
        }
        Commands::Add { title } => {
            let title = normalize_title(&title).ok_or_else(|| AppError::InvalidInput {
                message: "Todo text cannot be empty".into(),
            })?;
            cmd_add(open_service(&config)?, &title, format).await?;
        }
        Commands::Toggle { id } => {
            cmd_toggle(open_service(&config)?, &id, format).await?;
        }
        Commands::Delete { id } => {
            cmd_delete(open_service(&config)?, &id, format).await?;
        }
        Commands::Edit { id, title } => {
            let title = normalize_title(&title).ok_or_else(|| AppError::InvalidInput {
                message: "Todo text cannot be empty".into(),
            })?;
            cmd_edit(open_service(&config)?, &id, title, format).await?;
        }
        Commands::Show { id } => {
            cmd_show(open_service(&config)?, &id, format).await?;
        }
        Commands::Clear { yes } => {
            cmd_clear(&open_store(&config)?, yes).await?;
        }
        Commands::Config {
            set_delay_ms,
            set_backend,
        } => {
            cmd_config(&overrides, set_delay_ms, set_backend.as_deref())?;
        }
    }

    Ok(())
}

/// Settings given for this run only. Never written to the config file.
#[derive(Debug)]
struct RunOverrides {
    data_dir: Option<PathBuf>,
    delay_ms: Option<u64>,
}

impl RunOverrides {
    fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(dir) = &self.data_dir {
            config.paths.data_dir = Some(dir.clone());
        }
        if let Some(ms) = self.delay_ms {
            config.storage.simulated_delay_ms = ms;
        }
        config
    }
}

/// Build the storage medium and the service on top of it.
fn open_service(config: &AppConfig) -> domain::Result<Arc<dyn TodoService>> {
    Ok(Arc::new(open_store(config)?))
}

fn open_store(config: &AppConfig) -> domain::Result<StorageTodoService> {
    let storage: Arc<dyn KeyValueStorage> = match config.storage.backend {
        StorageBackend::Sqlite => Arc::new(LocalStorage::open(&config.storage_db_path())?),
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
    };

    tracing::debug!(
        backend = %config.storage.backend,
        delay_ms = config.storage.simulated_delay_ms,
        "Opened todo store"
    );

    Ok(StorageTodoService::with_delay(
        storage,
        config.simulated_delay(),
    ))
}

/// Mount a hook and wait for its initial load to settle.
async fn mount_loaded(service: Arc<dyn TodoService>) -> TodoHook {
    let hook = TodoHook::mount(service);

    let mut rx = hook.subscribe();
    if rx.wait_for(|s| !s.is_loading).await.is_err() {
        tracing::warn!("Todo state channel closed before loading finished");
    }

    hook
}

/// Add a todo command.
async fn cmd_add(
    service: Arc<dyn TodoService>,
    title: &str,
    format: OutputFormat,
) -> domain::Result<()> {
    let hook = mount_loaded(service).await;

    hook.add_todo(title).await;

    let state = hook.state();
    if state.error.is_none() {
        if let Some(todo) = state.todos.last() {
            println!("{} Added {}", "✓".green().bold(), todo.title.cyan());
        }
    }
    print_state(&state, format)?;

    hook.dispose();
    Ok(())
}

/// Toggle a todo command.
async fn cmd_toggle(
    service: Arc<dyn TodoService>,
    id: &str,
    format: OutputFormat,
) -> domain::Result<()> {
    let hook = mount_loaded(service).await;
    let id = resolve_id(&hook.state().todos, id)?;

    hook.toggle_todo(&id).await;

    let state = hook.state();
    if state.error.is_none() {
        if let Some(todo) = state.todos.iter().find(|t| t.id == id) {
            let status = if todo.completed { "done" } else { "not done" };
            println!(
                "{} Marked {} as {}",
                "✓".green().bold(),
                todo.title.cyan(),
                status
            );
        }
    }
    print_state(&state, format)?;

    hook.dispose();
    Ok(())
}

/// Delete a todo command.
async fn cmd_delete(
    service: Arc<dyn TodoService>,
    id: &str,
    format: OutputFormat,
) -> domain::Result<()> {
    let hook = mount_loaded(service).await;
    let id = resolve_id(&hook.state().todos, id)?;

    hook.delete_todo(&id).await;

    let state = hook.state();
    if was_deleted(&state, &id) {
        println!("{} Deleted {}", "✓".green().bold(), id);
    }
    print_state(&state, format)?;

    hook.dispose();
    Ok(())
}

/// True when the delete succeeded and the id is gone from the list.
fn was_deleted(state: &TodoState, id: &str) -> bool {
    state.error.is_none() && !state.todos.iter().any(|t| t.id == id)
}

/// Edit a todo's text command.
async fn cmd_edit(
    service: Arc<dyn TodoService>,
    id: &str,
    title: String,
    format: OutputFormat,
) -> domain::Result<()> {
    let hook = mount_loaded(service.clone()).await;
    let id = resolve_id(&hook.state().todos, id)?;
    hook.dispose();

    let updated = service
        .update(&id, UpdateTodoInput::title(title))
        .await?
        .ok_or_else(|| AppError::NotFound { id: id.clone() })?;

    print_todo(&updated, format)
}

/// Show a single todo command.
async fn cmd_show(
    service: Arc<dyn TodoService>,
    id: &str,
    format: OutputFormat,
) -> domain::Result<()> {
    let hook = mount_loaded(service.clone()).await;
    let id = resolve_id(&hook.state().todos, id)?;
    hook.dispose();

    let todo = service
        .get_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound { id: id.clone() })?;

    print_todo(&todo, format)
}

/// Remove every todo command.
async fn cmd_clear(store: &StorageTodoService, yes: bool) -> domain::Result<()> {
    if !yes {
        let count = store.get_all().await?.len();
        println!(
            "{} This removes {}. Re-run with --yes to confirm.",
            "⚠".yellow().bold(),
            format_item_count(count)
        );
        return Ok(());
    }

    store.clear().await?;
    println!("{} Cleared all todos", "✓".green().bold());
    Ok(())
}

/// Show configuration command, persisting any requested changes.
///
/// Only the `--set-*` values are saved. Run overrides are shown but not
/// persisted.
fn cmd_config(
    overrides: &RunOverrides,
    set_delay_ms: Option<u64>,
    set_backend: Option<&str>,
) -> domain::Result<()> {
    let set_backend = set_backend
        .map(str::parse::<StorageBackend>)
        .transpose()
        .map_err(|e| AppError::Config { message: e })?;

    let file_config = if set_delay_ms.is_some() || set_backend.is_some() {
        let (path, saved) =
            infrastructure::update_config(|c| apply_settings(c, set_delay_ms, set_backend))?;
        println!("{} Saved {}", "✓".green().bold(), path.display());
        saved
    } else {
        if infrastructure::ensure_config_exists()? {
            println!("{} Created default configuration", "✓".green().bold());
        }
        infrastructure::load_config()?
    };
    let config = overrides.apply(file_config);

    let db_path = config.storage_db_path();
    println!("{}", "⚙ Tasklist Configuration".bold());
    println!();
    println!(
        "  Config file:  {}",
        infrastructure::config_file_path().display()
    );
    println!("  Data dir:     {}", config.data_dir().display());
    println!("  Storage:      {}", db_path.display());
    println!("  Backend:      {}", config.storage.backend);
    println!("  Delay:        {} ms", config.storage.simulated_delay_ms);

    if config.storage.backend == StorageBackend::Sqlite && db_path.exists() {
        let storage = LocalStorage::open(&db_path)?;
        println!("  Slots:        {}", storage.slot_count()?);
    }

    Ok(())
}

/// Apply `config --set-*` values.
fn apply_settings(
    config: &mut AppConfig,
    delay_ms: Option<u64>,
    backend: Option<StorageBackend>,
) {
    if let Some(ms) = delay_ms {
        config.storage.simulated_delay_ms = ms;
    }
    if let Some(backend) = backend {
        config.storage.backend = backend;
    }
}

/// Render the hook state: error banner, list, footer.
fn print_state(state: &TodoState, format: OutputFormat) -> domain::Result<()> {
    if let Some(error) = &state.error {
        eprintln!("{}", format_error_banner(error));
    }

    let output = format_todos(&state.todos, format).map_err(AppError::json_parse)?;
    println!("{output}");

    if !matches!(format, OutputFormat::Json) {
        println!();
        println!("{}", format_item_count(state.todos.len()).dimmed());
    }

    Ok(())
}

/// Render a single todo.
fn print_todo(todo: &Todo, format: OutputFormat) -> domain::Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(todo).map_err(AppError::json_parse)?;
            println!("{json}");
        }
        OutputFormat::Markdown => {
            println!("{}", format_todo_markdown(todo));
            println!(
                "  {} {}",
                "Created:".dimmed(),
                todo.created_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!("  {} {}", "ID:".dimmed(), todo.id);
        }
        OutputFormat::Table => {
            let output =
                format_todos(std::slice::from_ref(todo), format).map_err(AppError::json_parse)?;
            println!("{output}");
        }
    }

    Ok(())
}

/// Resolve a full id or unique id prefix against the loaded todos.
fn resolve_id(todos: &[Todo], id_or_prefix: &str) -> domain::Result<String> {
    if todos.iter().any(|t| t.id == id_or_prefix) {
        return Ok(id_or_prefix.to_string());
    }

    let mut matches = todos.iter().filter(|t| t.id.starts_with(id_or_prefix));
    match (matches.next(), matches.next()) {
        (Some(todo), None) => Ok(todo.id.clone()),
        (None, _) => Err(AppError::NotFound {
            id: id_or_prefix.to_string(),
        }),
        (Some(_), Some(_)) => Err(AppError::InvalidInput {
            message: format!("Id prefix '{id_or_prefix}' matches more than one todo"),
        }),
    }
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
