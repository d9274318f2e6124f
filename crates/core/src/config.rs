//! Application configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file under
//! the platform config directory, then `MARKETPLACE_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::storage::{FileStorage, NoopStorage, Storage};

/// Backend used when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000/api";

/// Directory name under the platform config/data directories.
pub const APP_DIR: &str = "marketplace";

const CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "MARKETPLACE";

const DEFAULT_CONFIG: &str = r#"# Marketplace client configuration.
# Every value can be overridden with a MARKETPLACE_<KEY> environment variable.

# Base URL of the REST backend.
backend_url = "http://localhost:3000/api"

# Keep the session and cart between runs. When false, state lives in memory only.
persist = true

# Where persisted state and logs are written. Defaults to the platform data directory.
# data_dir = "/path/to/marketplace"
"#;

/// Resolved client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Base URL of the REST backend, without trailing slash.
    pub backend_url: String,
    /// Directory for persisted state and logs.
    pub data_dir: PathBuf,
    /// Whether session and cart survive restarts.
    pub persist: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            data_dir: default_data_dir(),
            persist: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration from an explicit file (which may be missing) and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("backend_url", defaults.backend_url)?
            .set_default("data_dir", defaults.data_dir.to_string_lossy().into_owned())?
            .set_default("persist", defaults.persist)?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;

        let mut config: AppConfig = settings
            .try_deserialize()
            .context("invalid configuration")?;
        config.backend_url = config.backend_url.trim_end_matches('/').to_string();
        Ok(config)
    }

    /// Storage port matching the `persist` setting.
    pub fn storage(&self) -> Arc<dyn Storage> {
        if self.persist {
            Arc::new(FileStorage::new(&self.data_dir))
        } else {
            Arc::new(NoopStorage)
        }
    }

    /// Directory for log files.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

/// Default config file location, e.g. `~/.config/marketplace/config.toml`.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

/// Default data directory, e.g. `~/.local/share/marketplace`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Write a commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
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
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote default configuration to {}", path.display());
    Ok(())
}
