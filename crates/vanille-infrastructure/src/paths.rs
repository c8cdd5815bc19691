//! Path management for Vanille's files.

use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "vanille";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for vanille_core::VanilleError {
    fn from(e: PathError) -> Self {
        vanille_core::VanilleError::config(e.to_string())
    }
}

/// Resolved locations of all Vanille files.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/vanille/           # Config directory
/// └── config.toml              # Application configuration
///
/// ~/.local/share/vanille/      # Data directory (overridable)
/// ├── settings.json            # Session configs, global credentials, active session
/// ├── messages/
/// │   └── message_<session_id>.json
/// └── logs/
///     └── vanille.log.YYYY-MM-DD
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VanillePaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl VanillePaths {
    /// Resolves the platform directories.
    pub fn platform() -> Result<Self, PathError> {
        let config_dir = dirs::config_dir()
            .ok_or(PathError::HomeDirNotFound)?
            .join(APP_DIR_NAME);
        let data_dir = dirs::data_dir()
            .ok_or(PathError::HomeDirNotFound)?
            .join(APP_DIR_NAME);
        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    /// Uses one base directory for everything (tests, portable installs).
    pub fn with_base(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref().to_path_buf();
        Self {
            config_dir: base.clone(),
            data_dir: base,
        }
    }

    /// Replaces the data directory, keeping the config directory.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }

    pub fn messages_dir(&self) -> PathBuf {
        self.data_dir.join("messages")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}
