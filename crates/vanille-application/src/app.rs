//! Application context.

use crate::global_config_service::GlobalConfigService;
use crate::session::{ChatSessionManager, SessionServices};
use std::sync::Arc;
use vanille_core::completion::CompletionClientFactory;
use vanille_core::config::AppConfig;
use vanille_infrastructure::storage::SettingsStorage;
use vanille_infrastructure::{
    JsonMessageRepository, SettingsGlobalConfigRepository, SettingsSessionRepository,
    VanillePaths,
};
use vanille_interaction::OpenAIClientFactory;

/// Everything a front end needs, wired once at startup.
pub struct ChatApp {
    pub paths: VanillePaths,
    pub config: AppConfig,
    pub sessions: ChatSessionManager,
    pub global: GlobalConfigService,
}

impl ChatApp {
    /// Wires file storage under `paths` and the HTTP completion client.
    pub fn new(paths: VanillePaths, config: AppConfig) -> Self {
        let clients = Arc::new(OpenAIClientFactory::new(
            config.request_timeout(),
            config.default_api_host.clone(),
        ));
        Self::with_client_factory(paths, config, clients)
    }

    pub fn with_client_factory(
        paths: VanillePaths,
        config: AppConfig,
        clients: Arc<dyn CompletionClientFactory>,
    ) -> Self {
        let settings = Arc::new(SettingsStorage::new(paths.settings_file()));
        let global_repository = Arc::new(SettingsGlobalConfigRepository::new(settings.clone()));

        let services = SessionServices {
            messages: Arc::new(JsonMessageRepository::new(paths.messages_dir())),
            configs: Arc::new(SettingsSessionRepository::new(settings)),
            clients,
            persist_debounce: config.persist_debounce(),
        };

        tracing::debug!("Data directory: {}", paths.data_dir().display());

        Self {
            sessions: ChatSessionManager::new(
                services,
                global_repository.clone(),
                config.default_model.clone(),
            ),
            global: GlobalConfigService::new(global_repository),
            paths,
            config,
        }
    }
}
