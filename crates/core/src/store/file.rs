//! Filesystem-backed key-value store.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::KeyValueStore;
use crate::error::{Result, StaysError};

/// Directory name under the user's data directory used for storage.
pub const DEFAULT_STORAGE_DIR: &str = "weekendizer";

/// Stores each key as `<root>/<namespace>/<key>.json`.
///
/// Writes land in a temporary file next to the target and are renamed into
/// place, so a crash never leaves a half-written value behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store for `namespace` beneath `root`. Nothing is touched on
    /// disk until the first write.
    pub fn new(root: impl AsRef<Path>, namespace: &str) -> Self {
        Self {
            dir: root.as_ref().join(sanitize_component(namespace)),
        }
    }

    /// Default location under the user's data directory.
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_STORAGE_DIR)
    }

    /// Directory holding this namespace's files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_component(key)))
    }
}

impl KeyValueStore for FileStore {
    /// Values that are not valid UTF-8 are treated as missing.
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StaysError::storage(key, err)),
        };
        match String::from_utf8(bytes) {
            Ok(content) => Ok(Some(content)),
            Err(err) => {
                warn!("Ignoring undecodable {}: {err}", path.display());
                Ok(None)
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|err| StaysError::storage(key, err))?;
        let path = self.path_for(key);
        let mut file =
            NamedTempFile::new_in(&self.dir).map_err(|err| StaysError::storage(key, err))?;
        file.write_all(value.as_bytes())
            .and_then(|_| file.as_file().sync_all())
            .map_err(|err| StaysError::storage(key, err))?;
        file.persist(&path)
            .map_err(|err| StaysError::storage(key, err.error))?;
        debug!("wrote {}", path.display());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StaysError::storage(key, err)),
        }
    }
}

fn sanitize_component(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        }
    }
    if result.is_empty() {
        "store".to_string()
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn set_get_remove_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let mut store = FileStore::new(dir.path(), "weekendizer");

        assert_eq!(store.get("trips")?, None);
        store.set("trips", "[]")?;
        assert!(dir.path().join("weekendizer/trips.json").exists());
        assert_eq!(store.get("trips")?.as_deref(), Some("[]"));

        store.set("trips", "[1]")?;
        assert_eq!(store.get("trips")?.as_deref(), Some("[1]"));

        store.remove("trips")?;
        assert_eq!(store.get("trips")?, None);
        store.remove("trips")?;
        Ok(())
    }

    #[test]
    fn invalid_utf8_reads_as_missing() -> Result<()> {
        let dir = tempdir()?;
        let mut store = FileStore::new(dir.path(), "weekendizer");
        fs::create_dir_all(store.dir())?;
        fs::write(store.dir().join("trips.json"), [0xff, 0xfe, 0x00])?;

        assert_eq!(store.get("trips")?, None);
        store.set("trips", "[]")?;
        assert_eq!(store.get("trips")?.as_deref(), Some("[]"));
        Ok(())
    }

    #[test]
    fn overwrite_leaves_no_temp_files() -> Result<()> {
        let dir = tempdir()?;
        let mut store = FileStore::new(dir.path(), "ns");
        store.set("currentTripId", "1")?;
        store.set("currentTripId", "2")?;
        let files: Vec<_> = fs::read_dir(store.dir())?.collect::<std::io::Result<_>>()?;
        assert_eq!(files.len(), 1);
        Ok(())
    }

    #[test]
    fn sanitize_creates_safe_filenames() {
        assert_eq!(sanitize_component("../trips?"), "trips");
        assert_eq!(sanitize_component("///"), "store");
    }
}
