use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_HOST: &str = "api.openai.com";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_PERSIST_DEBOUNCE_MS: u64 = 250;

/// Application settings read from `config.toml`.
///
/// All fields are optional in the file; missing ones take the defaults.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Overrides the platform data directory (messages, settings, logs).
    pub data_dir: Option<PathBuf>,
    /// Fixed timeout applied to every completion request.
    pub request_timeout_secs: u64,
    /// Minimum interval between message-file rewrites while streaming.
    pub persist_debounce_ms: u64,
    /// Model assigned to newly created sessions.
    pub default_model: String,
    /// Host used when neither the session nor the global config has one.
    pub default_api_host: String,
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            persist_debounce_ms: DEFAULT_PERSIST_DEBOUNCE_MS,
            default_model: crate::session::DEFAULT_MODEL.to_string(),
            default_api_host: DEFAULT_API_HOST.to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }
}
