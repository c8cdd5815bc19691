#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vanille_application::session::SessionServices;
use vanille_core::completion::{
    CompletionClient, CompletionClientFactory, CompletionDelta, CompletionRequest, DeltaStream,
};
use vanille_core::error::{Result, VanilleError};
use vanille_core::global::{GlobalConfig, GlobalConfigRepository};
use vanille_core::session::{MessageRepository, SessionConfig, SessionConfigRepository};
use vanille_core::{ChatMessage, MessageRole};

#[derive(Default)]
pub struct MemoryMessageRepository {
    pub stored: Mutex<HashMap<String, Vec<ChatMessage>>>,
    pub saves: AtomicUsize,
}

impl MemoryMessageRepository {
    pub fn stored(&self, session_id: &str) -> Vec<ChatMessage> {
        self.stored
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageRepository for MemoryMessageRepository {
    async fn load(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        Ok(self.stored(session_id))
    }

    async fn save(&self, session_id: &str, messages: &[ChatMessage]) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.stored
            .lock()
            .unwrap()
            .insert(session_id.to_string(), messages.to_vec());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.stored.lock().unwrap().remove(session_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySessionRepository {
    pub sessions: Mutex<Vec<SessionConfig>>,
    pub active: Mutex<Option<String>>,
}

#[async_trait]
impl SessionConfigRepository for MemorySessionRepository {
    async fn list_all(&self) -> Result<Vec<SessionConfig>> {
        Ok(self.sessions.lock().unwrap().clone())
    }

    async fn find_by_id(&self, session_id: &str) -> Result<Option<SessionConfig>> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.session_id == session_id)
            .cloned())
    }

    async fn save(&self, config: &SessionConfig) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions
            .iter_mut()
            .find(|c| c.session_id == config.session_id)
        {
            Some(existing) => *existing = config.clone(),
            None => sessions.push(config.clone()),
        }
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.sessions
            .lock()
            .unwrap()
            .retain(|c| c.session_id != session_id);
        let mut active = self.active.lock().unwrap();
        if active.as_deref() == Some(session_id) {
            *active = None;
        }
        Ok(())
    }

    async fn get_active_session_id(&self) -> Result<Option<String>> {
        Ok(self.active.lock().unwrap().clone())
    }

    async fn set_active_session_id(&self, session_id: &str) -> Result<()> {
        *self.active.lock().unwrap() = Some(session_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryGlobalRepository {
    pub config: Mutex<GlobalConfig>,
}

#[async_trait]
impl GlobalConfigRepository for MemoryGlobalRepository {
    async fn load(&self) -> Result<GlobalConfig> {
        Ok(self.config.lock().unwrap().clone())
    }

    async fn save(&self, config: &GlobalConfig) -> Result<()> {
        *self.config.lock().unwrap() = config.clone();
        Ok(())
    }
}

/// A recorded call to the scripted client.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub streaming: bool,
    pub request: CompletionRequest,
}

/// Completion client replaying queued responses.
#[derive(Default)]
pub struct ScriptedClient {
    streams: Mutex<VecDeque<Vec<Result<CompletionDelta>>>>,
    completions: Mutex<VecDeque<Result<ChatMessage>>>,
    pub requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedClient {
    pub fn push_stream(&self, items: Vec<Result<CompletionDelta>>) {
        self.streams.lock().unwrap().push_back(items);
    }

    pub fn push_completion(&self, result: Result<ChatMessage>) {
        self.completions.lock().unwrap().push_back(result);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, streaming: bool, request: CompletionRequest) {
        self.requests
            .lock()
            .unwrap()
            .push(RecordedRequest { streaming, request });
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage> {
        self.record(false, request);
        self.completions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(VanilleError::completion(None, "no scripted completion")))
    }

    async fn stream(&self, request: CompletionRequest) -> Result<DeltaStream> {
        self.record(true, request);
        let items = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| VanilleError::completion(Some(503), "no scripted stream"))?;
        Ok(futures::stream::iter(items).boxed())
    }
}

pub struct ScriptedFactory {
    pub client: Arc<ScriptedClient>,
    pub credentials: Mutex<Vec<(String, String)>>,
}

impl CompletionClientFactory for ScriptedFactory {
    fn client_for(&self, api_key: &str, api_host: &str) -> Result<Arc<dyn CompletionClient>> {
        self.credentials
            .lock()
            .unwrap()
            .push((api_key.to_string(), api_host.to_string()));
        Ok(self.client.clone())
    }
}

pub struct Harness {
    pub messages: Arc<MemoryMessageRepository>,
    pub configs: Arc<MemorySessionRepository>,
    pub global: Arc<MemoryGlobalRepository>,
    pub client: Arc<ScriptedClient>,
    pub factory: Arc<ScriptedFactory>,
    pub services: SessionServices,
}

impl Harness {
    pub fn new(persist_debounce: Duration) -> Self {
        let messages = Arc::new(MemoryMessageRepository::default());
        let configs = Arc::new(MemorySessionRepository::default());
        let global = Arc::new(MemoryGlobalRepository::default());
        let client = Arc::new(ScriptedClient::default());
        let factory = Arc::new(ScriptedFactory {
            client: client.clone(),
            credentials: Mutex::new(Vec::new()),
        });
        let services = SessionServices {
            messages: messages.clone(),
            configs: configs.clone(),
            clients: factory.clone(),
            persist_debounce,
        };
        Self {
            messages,
            configs,
            global,
            client,
            factory,
            services,
        }
    }

    /// Stores a session config and its messages.
    pub fn seed(&self, config: &SessionConfig, history: Vec<ChatMessage>) {
        self.configs.sessions.lock().unwrap().push(config.clone());
        self.messages
            .stored
            .lock()
            .unwrap()
            .insert(config.session_id.clone(), history);
    }
}

/// `n` alternating user/assistant messages `m1..mn` with `created = i`.
pub fn numbered(n: usize) -> Vec<ChatMessage> {
    (1..=n)
        .map(|i| {
            let role = if i % 2 == 0 {
                MessageRole::Assistant
            } else {
                MessageRole::User
            };
            ChatMessage::with_created(role, format!("m{i}"), i as i64)
        })
        .collect()
}

pub fn delta(id: &str, content: &str) -> Result<CompletionDelta> {
    Ok(CompletionDelta {
        id: id.to_string(),
        role: Some(MessageRole::Assistant),
        content: content.to_string(),
        ..Default::default()
    })
}

pub fn final_delta(id: &str, content: &str) -> Result<CompletionDelta> {
    Ok(CompletionDelta {
        id: id.to_string(),
        content: content.to_string(),
        finish_reason: Some("stop".to_string()),
        ..Default::default()
    })
}

pub fn contents(messages: &[ChatMessage]) -> Vec<&str> {
    messages.iter().map(|m| m.content.as_str()).collect()
}
