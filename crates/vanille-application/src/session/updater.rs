//! Session config updater helper.
//!
//! `SessionConfigUpdater` wraps the "find → update → save" pattern every
//! settings change goes through, so each change is persisted immediately.

use std::sync::Arc;
use vanille_core::error::{Result, VanilleError};
use vanille_core::session::{SessionConfig, SessionConfigRepository};

pub struct SessionConfigUpdater {
    repository: Arc<dyn SessionConfigRepository>,
}

impl SessionConfigUpdater {
    pub fn new(repository: Arc<dyn SessionConfigRepository>) -> Self {
        Self { repository }
    }

    /// Loads a config, applies `updater`, stamps `updated_at` and saves it.
    ///
    /// The summary list is trimmed to `compress_memory_count` before saving.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The session doesn't exist
    /// - The updater function returns an error (nothing is saved)
    /// - Saving to storage fails
    pub async fn update<F>(&self, session_id: &str, updater: F) -> Result<SessionConfig>
    where
        F: FnOnce(&mut SessionConfig) -> Result<()>,
    {
        let mut config = self
            .repository
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| VanilleError::not_found("Session", session_id))?;

        updater(&mut config)?;
        config.trim_compressed_memory();

        config.updated_at = chrono::Utc::now().to_rfc3339();
        self.repository.save(&config).await?;

        tracing::debug!(
            "[SessionConfigUpdater] Saved session: id={}, name={}",
            config.session_id,
            config.session_name
        );
        Ok(config)
    }
}
