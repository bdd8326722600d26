//! Configuration management for routecache

pub mod schema;

pub use schema::Config;

use crate::error::{RouteCacheError, RouteCacheResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Project-local configuration file name
pub const LOCAL_CONFIG_NAME: &str = ".routecache.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("routecache")
            .join("config.toml")
    }

    /// Find `.routecache.toml` in `start` or the nearest ancestor
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(LOCAL_CONFIG_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Load the global config with an optional project-local overlay.
    ///
    /// Tables merge key by key; arrays and scalars in the overlay replace
    /// the global value wholesale.
    pub async fn load_merged(&self, local: Option<&Path>) -> RouteCacheResult<Config> {
        let mut merged = toml::Value::Table(toml::map::Map::new());

        if self.config_path.exists() {
            merged = read_value(&self.config_path).await?;
        } else {
            debug!("Config file not found, using defaults");
        }

        let mut source = self.config_path.clone();
        if let Some(local_path) = local {
            debug!("Applying local config {}", local_path.display());
            let overlay = read_value(local_path).await?;
            merge_values(&mut merged, overlay);
            source = local_path.to_path_buf();
        }

        let config: Config =
            merged
                .try_into()
                .map_err(|e: toml::de::Error| RouteCacheError::ConfigInvalid {
                    path: source.clone(),
                    reason: e.to_string(),
                })?;

        config
            .validate()
            .map_err(|reason| RouteCacheError::ConfigInvalid {
                path: source,
                reason,
            })?;

        Ok(config)
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_value(path: &Path) -> RouteCacheResult<toml::Value> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| RouteCacheError::io(format!("reading config from {}", path.display()), e))?;

    toml::from_str(&content).map_err(|e| RouteCacheError::ConfigInvalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
