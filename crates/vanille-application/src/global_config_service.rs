//! Global API key and host management.

use std::sync::Arc;
use vanille_core::error::Result;
use vanille_core::global::{GlobalConfig, GlobalConfigRepository};

/// Adds and removes global credentials; every change is saved at once.
pub struct GlobalConfigService {
    repository: Arc<dyn GlobalConfigRepository>,
}

impl GlobalConfigService {
    pub fn new(repository: Arc<dyn GlobalConfigRepository>) -> Self {
        Self { repository }
    }

    pub async fn get(&self) -> Result<GlobalConfig> {
        self.repository.load().await
    }

    /// Returns whether the key was new.
    pub async fn add_api_key(&self, key: &str) -> Result<bool> {
        self.modify(|config| config.add_api_key(key)).await
    }

    pub async fn remove_api_key(&self, index: usize) -> Result<Option<String>> {
        self.modify(|config| config.remove_api_key(index)).await
    }

    /// Returns whether the host was new.
    pub async fn add_api_host(&self, host: &str) -> Result<bool> {
        self.modify(|config| config.add_api_host(host)).await
    }

    pub async fn remove_api_host(&self, index: usize) -> Result<Option<String>> {
        self.modify(|config| config.remove_api_host(index)).await
    }

    async fn modify<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut GlobalConfig) -> R,
    {
        let mut config = self.repository.load().await?;
        let result = f(&mut config);
        self.repository.save(&config).await?;
        Ok(result)
    }
}
