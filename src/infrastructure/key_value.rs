//! Key-value storage medium.
//!
//! A synchronous string slot store in the spirit of browser local storage.
//! The todo store keeps its whole collection under one key.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::domain::{AppError, Result};

/// Synchronous key-value storage.
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`, or `None` when the slot is empty.
    ///
    /// # Errors
    /// Returns error if the medium cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing anything already there.
    ///
    /// # Errors
    /// Returns error if the medium cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Drop the slot under `key`. Removing an empty slot is not an error.
    ///
    /// # Errors
    /// Returns error if the medium cannot be written.
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// In-process storage backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> AppError {
    AppError::storage("memory storage lock poisoned")
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let slots = self.slots.lock().map_err(poisoned)?;
        Ok(slots.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut slots = self.slots.lock().map_err(poisoned)?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.slots.lock().map_err(poisoned)?.remove(key);
        Ok(())
    }
}
