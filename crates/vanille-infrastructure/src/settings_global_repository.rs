use crate::storage::{GLOBAL_CONFIG_KEY, SettingsStorage};
use async_trait::async_trait;
use std::sync::Arc;
use vanille_core::error::Result;
use vanille_core::global::{GlobalConfig, GlobalConfigRepository};

/// Global credentials stored under `global_config` in the settings blob.
pub struct SettingsGlobalConfigRepository {
    storage: Arc<SettingsStorage>,
}

impl SettingsGlobalConfigRepository {
    pub fn new(storage: Arc<SettingsStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl GlobalConfigRepository for SettingsGlobalConfigRepository {
    async fn load(&self) -> Result<GlobalConfig> {
        Ok(self
            .storage
            .get::<GlobalConfig>(GLOBAL_CONFIG_KEY)?
            .unwrap_or_default())
    }

    async fn save(&self, config: &GlobalConfig) -> Result<()> {
        self.storage.set(GLOBAL_CONFIG_KEY, config)?;
        Ok(())
    }
}
