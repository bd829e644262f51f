//! Durable key-value persistence for trips.

/// One-file-per-key backend on the local filesystem.
pub mod file;
/// In-process backend.
pub mod memory;
/// Load/persist of the whole trip collection.
pub mod trips;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use trips::{TripStore, CURRENT_TRIP_KEY, TRIPS_KEY};

use crate::error::Result;

/// Synchronous string key-value slot.
pub trait KeyValueStore {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;
    /// Replace the value stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    /// Delete `key`; a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}
