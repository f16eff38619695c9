//! Configuration file management.
//!
//! Handles loading and saving TOML configuration files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{AppConfig, AppError, Result};

/// Default configuration file content.
const DEFAULT_CONFIG: &str = r#"# Tasklist Configuration
# Auto-generated - edit as needed

[storage]
# Artificial latency for every store operation in milliseconds (default: 100)
simulated_delay_ms = 100

# Storage medium: "sqlite" (persistent) or "memory" (discarded on exit)
backend = "sqlite"

[paths]
# Custom data directory (optional, defaults to ~/.tasklist)
# data_dir = "/custom/path"
"#;

/// Load configuration from file or fall back to defaults.
///
/// # Errors
/// Returns error if file exists but cannot be read or parsed.
pub fn load_config() -> Result<AppConfig> {
    let config_path = config_file_path();

    if config_path.exists() {
        load_config_from_file(&config_path)
    } else {
        tracing::debug!(path = %config_path.display(), "No config file, using defaults");
        Ok(AppConfig::default())
    }
}

/// Load configuration from a specific file.
///
/// # Errors
/// Returns error if file cannot be read or parsed.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config file: {}", path.display()), e))?;

    toml::from_str(&content).map_err(|e| AppError::Config {
        message: format!("Failed to parse config file: {e}"),
    })
}

/// Change settings in the default config file and save it.
///
/// Returns the file path and the saved configuration.
///
/// # Errors
/// Returns error if the file cannot be read, parsed or written.
pub fn update_config(update: impl FnOnce(&mut AppConfig)) -> Result<(PathBuf, AppConfig)> {
    let config_path = config_file_path();
    let config = update_config_at(&config_path, update)?;
    Ok((config_path, config))
}

/// Change settings in the config file at `path` and save it.
///
/// Only what `update` touches changes. A missing file starts from defaults.
///
/// # Errors
/// Returns error if the file cannot be read, parsed or written.
pub fn update_config_at(path: &Path, update: impl FnOnce(&mut AppConfig)) -> Result<AppConfig> {
    let mut config = if path.exists() {
        load_config_from_file(path)?
    } else {
        AppConfig::default()
    };

    update(&mut config);
    save_config_to(&config, path)?;
    Ok(config)
}

/// Save configuration to a specific file.
///
/// # Errors
/// Returns error if file cannot be written.
pub fn save_config_to(config: &AppConfig, config_path: &Path) -> Result<()> {
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create config directory", e))?;
    }

    let content = toml::to_string_pretty(config).map_err(|e| AppError::Config {
        message: format!("Failed to serialize config: {e}"),
    })?;

    fs::write(config_path, content).map_err(|e| {
        AppError::io(
            format!("Failed to write config file: {}", config_path.display()),
            e,
        )
    })?;

    tracing::info!(path = %config_path.display(), "Configuration saved");

    Ok(())
}

/// Create default configuration file if it doesn't exist.
///
/// Returns `true` when a new file was written.
///
/// # Errors
/// Returns error if file cannot be created.
pub fn ensure_config_exists() -> Result<bool> {
    ensure_config_at(&config_file_path())
}

fn ensure_config_at(config_path: &Path) -> Result<bool> {
    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create config directory", e))?;
    }

    fs::write(config_path, DEFAULT_CONFIG)
        .map_err(|e| AppError::io("Failed to create default config", e))?;

    tracing::info!(path = %config_path.display(), "Created default configuration");

    Ok(true)
}

/// Get the path to the configuration file.
#[must_use]
pub fn config_file_path() -> PathBuf {
    AppConfig::default_data_dir().join("config.toml")
}
