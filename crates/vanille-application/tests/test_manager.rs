mod common;

use common::*;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use vanille_application::{ChatApp, ChatSessionManager, GlobalConfigService};
use vanille_core::config::AppConfig;
use vanille_core::global::GlobalConfig;
use vanille_core::session::{DEFAULT_SESSION_NAME, SessionConfig};
use vanille_infrastructure::VanillePaths;

fn manager(harness: &Harness) -> ChatSessionManager {
    ChatSessionManager::new(harness.services.clone(), harness.global.clone(), "gpt-4")
}

#[tokio::test]
async fn test_create_session_uses_global_credentials() {
    let harness = Harness::new(Duration::ZERO);
    *harness.global.config.lock().unwrap() = GlobalConfig {
        api_keys: vec!["sk-1".into(), "sk-2".into()],
        api_hosts: vec!["proxy.example".into()],
    };
    let manager = manager(&harness);

    let config = manager.create_session(None).await.unwrap();

    assert_eq!(config.session_name, DEFAULT_SESSION_NAME);
    assert_eq!(config.model, "gpt-4");
    assert_eq!(config.api_key, "sk-1");
    assert_eq!(config.api_host, "proxy.example");
    assert_eq!(
        manager.active_session_id().await.unwrap(),
        Some(config.session_id.clone())
    );
}

#[tokio::test]
async fn test_restore_prefers_active_then_newest() {
    let harness = Harness::new(Duration::ZERO);
    let manager = manager(&harness);

    // Nothing stored: a session is created.
    let created = manager.restore_or_create().await.unwrap();
    assert_eq!(manager.list_sessions().await.unwrap().len(), 1);

    let second = manager.create_session(Some("second")).await.unwrap();
    manager
        .switch_session(created.session_id())
        .await
        .unwrap();
    let restored = manager.restore_or_create().await.unwrap();
    assert_eq!(restored.session_id(), created.session_id());

    // A dangling active id falls back to the newest session.
    *harness.configs.active.lock().unwrap() = Some("gone".into());
    let restored = manager.restore_or_create().await.unwrap();
    assert_eq!(restored.session_id(), second.session_id);
    assert_eq!(
        manager.active_session_id().await.unwrap(),
        Some(second.session_id.clone())
    );
}

#[tokio::test]
async fn test_switch_loads_messages() {
    let harness = Harness::new(Duration::ZERO);
    let config = SessionConfig::new("seeded");
    harness.seed(&config, numbered(3));
    let manager = manager(&harness);

    let lifecycle = manager.switch_session(&config.session_id).await.unwrap();

    assert_eq!(contents(lifecycle.messages()), vec!["m1", "m2", "m3"]);
    assert!(manager.switch_session("missing").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_open_fills_missing_credentials() {
    let harness = Harness::new(Duration::ZERO);
    let config = SessionConfig::new("no key");
    harness.seed(&config, Vec::new());
    harness.global.config.lock().unwrap().add_api_key("sk-late");
    let manager = manager(&harness);

    let lifecycle = manager.open_session(&config.session_id).await.unwrap();

    assert_eq!(lifecycle.config().api_key, "sk-late");
    assert_eq!(
        harness.configs.sessions.lock().unwrap()[0].api_key,
        "sk-late"
    );
}

#[tokio::test]
async fn test_rename_session() {
    let harness = Harness::new(Duration::ZERO);
    let manager = manager(&harness);
    let config = manager.create_session(Some("old")).await.unwrap();

    let renamed = manager
        .rename_session(&config.session_id, "  new  ")
        .await
        .unwrap();

    assert_eq!(renamed.session_name, "new");
    assert!(manager.rename_session(&config.session_id, " ").await.is_err());
    assert!(manager.rename_session("missing", "x").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_delete_active_session_activates_newest_remaining() {
    let harness = Harness::new(Duration::ZERO);
    let manager = manager(&harness);
    let first = manager.create_session(Some("first")).await.unwrap();
    let second = manager.create_session(Some("second")).await.unwrap();
    harness
        .messages
        .stored
        .lock()
        .unwrap()
        .insert(second.session_id.clone(), numbered(2));

    let active = manager.delete_session(&second.session_id).await.unwrap();

    assert_eq!(active, first.session_id);
    assert_eq!(manager.list_sessions().await.unwrap().len(), 1);
    assert!(
        !harness
            .messages
            .stored
            .lock()
            .unwrap()
            .contains_key(&second.session_id)
    );
}

#[tokio::test]
async fn test_delete_last_session_creates_new_one() {
    let harness = Harness::new(Duration::ZERO);
    let manager = manager(&harness);
    let only = manager.create_session(None).await.unwrap();

    let active = manager.delete_session(&only.session_id).await.unwrap();

    assert_ne!(active, only.session_id);
    let sessions = manager.list_sessions().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].session_id, active);
}

#[tokio::test]
async fn test_delete_inactive_session_keeps_active() {
    let harness = Harness::new(Duration::ZERO);
    let manager = manager(&harness);
    let first = manager.create_session(Some("first")).await.unwrap();
    let second = manager.create_session(Some("second")).await.unwrap();

    let active = manager.delete_session(&first.session_id).await.unwrap();

    assert_eq!(active, second.session_id);
}

#[tokio::test]
async fn test_global_config_service() {
    let harness = Harness::new(Duration::ZERO);
    let service = GlobalConfigService::new(harness.global.clone());

    assert!(service.add_api_key("sk-1").await.unwrap());
    assert!(!service.add_api_key("sk-1").await.unwrap());
    assert!(service.add_api_host("api.openai.com").await.unwrap());
    assert_eq!(service.remove_api_key(5).await.unwrap(), None);
    assert_eq!(service.remove_api_key(0).await.unwrap(), Some("sk-1".into()));

    let config = service.get().await.unwrap();
    assert!(config.api_keys.is_empty());
    assert_eq!(config.api_hosts, vec!["api.openai.com"]);
}

#[tokio::test]
async fn test_chat_app_round_trip_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let paths = VanillePaths::with_base(temp_dir.path());
    let harness = Harness::new(Duration::ZERO);
    harness
        .client
        .push_stream(vec![final_delta("chatcmpl-1", "hello")]);

    let app = ChatApp::with_client_factory(
        paths.clone(),
        AppConfig::default(),
        harness.factory.clone(),
    );
    app.global.add_api_key("sk-disk").await.unwrap();
    let mut lifecycle = app.sessions.restore_or_create().await.unwrap();
    lifecycle.send_message("hi").await.unwrap();
    let session_id = lifecycle.session_id().to_string();
    drop(app);

    // A second app over the same directory sees the same state.
    let idle = Arc::new(ScriptedFactory {
        client: Arc::new(ScriptedClient::default()),
        credentials: Default::default(),
    });
    let reopened = ChatApp::with_client_factory(paths, AppConfig::default(), idle);
    let restored = reopened.sessions.restore_or_create().await.unwrap();
    assert_eq!(restored.session_id(), session_id);
    assert_eq!(contents(restored.messages()), vec!["hi", "hello"]);
    assert_eq!(restored.config().api_key, "sk-disk");
}
