//! Layered application configuration.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{manager::TripPolicy, store::FileStore};

/// Directory under the user's config directory holding `config.toml`.
pub const CONFIG_DIR: &str = "weekendizer";
/// Prefix for environment variable overrides, e.g. `WEEKENDIZER_NAMESPACE`.
pub const ENV_PREFIX: &str = "WEEKENDIZER";

const DEFAULT_CONFIG: &str = r#"# Weekendizer configuration.

# Directory holding stored trips. Defaults to the platform data directory.
# storage_dir = "/home/me/.local/share/weekendizer"

# Namespace the storage keys live under.
namespace = "weekendizer"

# Refuse to create a trip whose name is already taken.
reject_duplicate_names = true

# Trip name that can never be deleted. Set to "" to allow deleting every trip.
protected_trip_name = "default"

# Create the protected trip automatically when no trips exist.
seed_default_trip = true
"#;

/// Settings resolved from defaults, `config.toml` and the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root directory of the file store.
    pub storage_dir: PathBuf,
    /// Namespace for the storage keys.
    pub namespace: String,
    /// Reject trips whose name is already in use.
    pub reject_duplicate_names: bool,
    /// Name of the trip that cannot be deleted; empty disables protection.
    pub protected_trip_name: String,
    /// Seed the protected trip when storage holds no trips.
    pub seed_default_trip: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_dir: FileStore::default_root(),
            namespace: "weekendizer".to_string(),
            reject_duplicate_names: true,
            protected_trip_name: "default".to_string(),
            seed_default_trip: true,
        }
    }
}

impl AppConfig {
    /// Location of the user's `config.toml`.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join("config.toml")
    }

    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from `path` (which may be missing) plus the
    /// environment, on top of the built-in defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default(
                "storage_dir",
                defaults.storage_dir.to_string_lossy().to_string(),
            )?
            .set_default("namespace", defaults.namespace)?
            .set_default("reject_duplicate_names", defaults.reject_duplicate_names)?
            .set_default("protected_trip_name", defaults.protected_trip_name)?
            .set_default("seed_default_trip", defaults.seed_default_trip)?
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;

        settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// File-backed store described by this configuration.
    pub fn file_store(&self) -> FileStore {
        FileStore::new(&self.storage_dir, &self.namespace)
    }

    /// Trip rules described by this configuration.
    pub fn policy(&self) -> TripPolicy {
        let protected = self.protected_trip_name.trim();
        TripPolicy {
            reject_duplicate_names: self.reject_duplicate_names,
            protected_trip_name: (!protected.is_empty()).then(|| protected.to_string()),
            seed_default_trip: self.seed_default_trip,
        }
    }
}

/// Write a commented default `config.toml` if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = AppConfig::config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))
}
