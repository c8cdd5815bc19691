use super::lifecycle::{SessionLifecycle, SessionServices};
use super::updater::SessionConfigUpdater;
use std::sync::Arc;
use vanille_core::error::{Result, VanilleError};
use vanille_core::global::GlobalConfigRepository;
use vanille_core::session::{DEFAULT_SESSION_NAME, SessionConfig};

/// Manages the set of sessions and which one is active.
///
/// `ChatSessionManager` is responsible for:
/// - Creating new sessions with credentials from the global config
/// - Restoring the active session on startup
/// - Switching, renaming and deleting sessions
/// - Persisting every settings change through [`SessionConfigUpdater`]
pub struct ChatSessionManager {
    services: SessionServices,
    global: Arc<dyn GlobalConfigRepository>,
    updater: SessionConfigUpdater,
    default_model: String,
}

impl ChatSessionManager {
    pub fn new(
        services: SessionServices,
        global: Arc<dyn GlobalConfigRepository>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            updater: SessionConfigUpdater::new(services.configs.clone()),
            services,
            global,
            default_model: default_model.into(),
        }
    }

    pub fn services(&self) -> &SessionServices {
        &self.services
    }

    /// All sessions in creation order.
    pub async fn list_sessions(&self) -> Result<Vec<SessionConfig>> {
        self.services.configs.list_all().await
    }

    pub async fn find_session(&self, session_id: &str) -> Result<SessionConfig> {
        self.services
            .configs
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| VanilleError::not_found("Session", session_id))
    }

    pub async fn active_session_id(&self) -> Result<Option<String>> {
        self.services.configs.get_active_session_id().await
    }

    /// Creates a session with default settings and makes it active.
    pub async fn create_session(&self, name: Option<&str>) -> Result<SessionConfig> {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_SESSION_NAME);

        let mut config = SessionConfig::new(name);
        config.model = self.default_model.clone();
        config.fill_credentials(&self.global.load().await?);

        self.services.configs.save(&config).await?;
        self.services
            .configs
            .set_active_session_id(&config.session_id)
            .await?;
        tracing::info!("Created session {} ({})", config.session_id, config.session_name);
        Ok(config)
    }

    /// Opens the active session, falling back to the newest one, or a new one.
    pub async fn restore_or_create(&self) -> Result<SessionLifecycle> {
        if let Some(active_id) = self.active_session_id().await? {
            if self.services.configs.find_by_id(&active_id).await?.is_some() {
                return self.open_session(&active_id).await;
            }
            tracing::warn!("Active session {} no longer exists", active_id);
        }

        match self.list_sessions().await?.pop() {
            Some(last) => self.switch_session(&last.session_id).await,
            None => {
                let config = self.create_session(None).await?;
                self.open_session(&config.session_id).await
            }
        }
    }

    /// Makes a session active and loads its messages.
    pub async fn switch_session(&self, session_id: &str) -> Result<SessionLifecycle> {
        let lifecycle = self.open_session(session_id).await?;
        self.services
            .configs
            .set_active_session_id(session_id)
            .await?;
        Ok(lifecycle)
    }

    /// Loads a session without changing which one is active.
    ///
    /// Empty credentials are filled from the global config and saved.
    pub async fn open_session(&self, session_id: &str) -> Result<SessionLifecycle> {
        let mut config = self.find_session(session_id).await?;

        if config.api_key.is_empty() || config.api_host.is_empty() {
            let global = self.global.load().await?;
            let mut filled = config.clone();
            filled.fill_credentials(&global);
            if filled != config {
                config = self
                    .updater
                    .update(session_id, |c| {
                        c.fill_credentials(&global);
                        Ok(())
                    })
                    .await?;
            }
        }

        SessionLifecycle::load(config, self.services.clone()).await
    }

    pub async fn rename_session(&self, session_id: &str, name: &str) -> Result<SessionConfig> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(VanilleError::invalid_input("session name must not be empty"));
        }
        self.update_session(session_id, |config| {
            config.session_name = name;
            Ok(())
        })
        .await
    }

    /// Applies and persists a settings change.
    pub async fn update_session<F>(&self, session_id: &str, f: F) -> Result<SessionConfig>
    where
        F: FnOnce(&mut SessionConfig) -> Result<()>,
    {
        self.updater.update(session_id, f).await
    }

    /// Deletes a session and its messages.
    ///
    /// When the deleted session was active, the newest remaining session
    /// becomes active, or a new one is created. Returns the active session id.
    pub async fn delete_session(&self, session_id: &str) -> Result<String> {
        self.find_session(session_id).await?;
        let was_active = self.active_session_id().await?.as_deref() == Some(session_id);

        self.services.configs.delete(session_id).await?;
        if let Err(e) = self.services.messages.delete(session_id).await {
            tracing::warn!("Failed to delete messages of {}: {}", session_id, e);
        }
        tracing::info!("Deleted session {}", session_id);

        if !was_active {
            if let Some(active) = self.active_session_id().await? {
                return Ok(active);
            }
        }

        match self.list_sessions().await?.pop() {
            Some(last) => {
                self.services
                    .configs
                    .set_active_session_id(&last.session_id)
                    .await?;
                Ok(last.session_id)
            }
            None => Ok(self.create_session(None).await?.session_id),
        }
    }
}
