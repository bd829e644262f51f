//! In-memory key-value store.

use std::{collections::HashMap, io};

use super::KeyValueStore;
use crate::error::{Result, StaysError};

/// `HashMap`-backed store that lives as long as the process.
///
/// Writes can be made to fail on demand, which lets callers exercise their
/// rollback paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set`/`remove` fail (or succeed again).
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        if self.fail_writes {
            return Err(StaysError::storage(
                key,
                io::Error::new(io::ErrorKind::PermissionDenied, "writes disabled"),
            ));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.check_writable(key)?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.check_writable(key)?;
        self.entries.remove(key);
        Ok(())
    }
}
