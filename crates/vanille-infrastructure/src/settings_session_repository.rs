//! Session configs stored in the shared settings blob.

use crate::storage::{ACTIVE_SESSION_KEY, CHAT_SESSIONS_KEY, SettingsStorage};
use async_trait::async_trait;
use std::sync::Arc;
use vanille_core::error::Result;
use vanille_core::session::{SessionConfig, SessionConfigRepository};

/// All session configs live as one array under `chat_sessions`; the active
/// session id lives under `active_session`.
pub struct SettingsSessionRepository {
    storage: Arc<SettingsStorage>,
}

impl SettingsSessionRepository {
    pub fn new(storage: Arc<SettingsStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl SessionConfigRepository for SettingsSessionRepository {
    async fn list_all(&self) -> Result<Vec<SessionConfig>> {
        Ok(self
            .storage
            .get::<Vec<SessionConfig>>(CHAT_SESSIONS_KEY)?
            .unwrap_or_default())
    }

    async fn find_by_id(&self, session_id: &str) -> Result<Option<SessionConfig>> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .find(|c| c.session_id == session_id))
    }

    async fn save(&self, config: &SessionConfig) -> Result<()> {
        let mut config = config.clone();
        config.updated_at = chrono::Utc::now().to_rfc3339();

        self.storage
            .update::<Vec<SessionConfig>, _, _>(CHAT_SESSIONS_KEY, |sessions| {
                match sessions
                    .iter_mut()
                    .find(|c| c.session_id == config.session_id)
                {
                    Some(existing) => *existing = config,
                    None => sessions.push(config),
                }
            })?;
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let removed = self
            .storage
            .update::<Vec<SessionConfig>, _, _>(CHAT_SESSIONS_KEY, |sessions| {
                let before = sessions.len();
                sessions.retain(|c| c.session_id != session_id);
                before != sessions.len()
            })?;

        if removed {
            tracing::debug!("Deleted session config {}", session_id);
        }

        if self.get_active_session_id().await?.as_deref() == Some(session_id) {
            self.storage.remove(ACTIVE_SESSION_KEY)?;
        }
        Ok(())
    }

    async fn get_active_session_id(&self) -> Result<Option<String>> {
        Ok(self
            .storage
            .get::<String>(ACTIVE_SESSION_KEY)?
            .filter(|id| !id.is_empty()))
    }

    async fn set_active_session_id(&self, session_id: &str) -> Result<()> {
        self.storage
            .set(ACTIVE_SESSION_KEY, &session_id.to_string())?;
        Ok(())
    }
}
