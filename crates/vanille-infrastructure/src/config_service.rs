//! Configuration service implementation.
//!
//! Loads the application configuration from `config.toml` in the config
//! directory. A missing file yields the defaults; a malformed one is
//! reported and also falls back to the defaults.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use vanille_core::config::AppConfig;
use vanille_core::error::Result;

/// Loads and caches the application configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration; `None` until first access or after invalidation.
    config: Arc<RwLock<Option<AppConfig>>>,
}

impl ConfigService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    pub fn get_config(&self) -> AppConfig {
        if let Ok(read_lock) = self.config.read() {
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = match Self::load_from(&self.path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable config {}: {}",
                    self.path.display(),
                    e
                );
                AppConfig::default()
            }
        };

        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = Some(loaded.clone());
        }
        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = None;
        }
    }

    /// Reads a config file; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            return Ok(AppConfig::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}
