//! Global API credentials shared by all sessions.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// API keys and hosts the user has registered.
///
/// New sessions (and sessions whose key or host is empty) use the first
/// entry of each list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub api_keys: Vec<String>,
    pub api_hosts: Vec<String>,
}

impl GlobalConfig {
    /// Adds a key unless it is blank or already present. Returns whether it was added.
    pub fn add_api_key(&mut self, key: impl Into<String>) -> bool {
        push_unique(&mut self.api_keys, key.into())
    }

    pub fn remove_api_key(&mut self, index: usize) -> Option<String> {
        (index < self.api_keys.len()).then(|| self.api_keys.remove(index))
    }

    /// Adds a host unless it is blank or already present. Returns whether it was added.
    pub fn add_api_host(&mut self, host: impl Into<String>) -> bool {
        push_unique(&mut self.api_hosts, host.into())
    }

    pub fn remove_api_host(&mut self, index: usize) -> Option<String> {
        (index < self.api_hosts.len()).then(|| self.api_hosts.remove(index))
    }
}

fn push_unique(list: &mut Vec<String>, value: String) -> bool {
    let value = value.trim().to_string();
    if value.is_empty() || list.contains(&value) {
        return false;
    }
    list.push(value);
    true
}

/// Persistence of the global credential lists.
#[async_trait]
pub trait GlobalConfigRepository: Send + Sync {
    /// Loads the global config; missing storage yields the default.
    async fn load(&self) -> Result<GlobalConfig>;

    async fn save(&self, config: &GlobalConfig) -> Result<()>;
}
