//! Infrastructure layer - external adapters (storage, filesystem).
//!
//! This layer handles all I/O operations and external dependencies.

pub mod config;
pub mod key_value;
pub mod local_storage;

pub use config::{config_file_path, ensure_config_exists, load_config, update_config};
pub use key_value::{KeyValueStorage, MemoryStorage};
pub use local_storage::LocalStorage;
