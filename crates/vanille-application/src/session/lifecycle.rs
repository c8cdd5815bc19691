//! Message lifecycle of one chat session.
//!
//! [`SessionLifecycle`] owns the in-memory message list and config of a
//! session. Sending builds the request context, persists the user message,
//! folds the streamed response into the list and then compresses history
//! that left the memory window.

use super::persist::PersistThrottle;
use super::updater::SessionConfigUpdater;
use futures::StreamExt;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use vanille_core::completion::{CompletionClientFactory, CompletionDelta, CompletionRequest};
use vanille_core::error::{Result, VanilleError};
use vanille_core::message::now_millis;
use vanille_core::session::{
    MessageRepository, SessionConfig, SessionConfigRepository, build_request_messages,
    compression_candidate,
};
use vanille_core::{ChatMessage, MessageRole};

/// Temperature of summarization requests.
pub const COMPRESSION_TEMPERATURE: f64 = 0.5;

/// Progress of the current send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendState {
    #[default]
    Idle,
    AwaitingFirstDelta,
    Streaming,
    Finished,
    Failed,
}

/// Notifications for a front end rendering the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged(SendState),
    /// A message was added at the end of the list.
    MessageAppended(ChatMessage),
    /// Streamed text was appended to the last message.
    MessageExtended { index: usize, delta: String },
    /// Messages were removed (delete, resend, clear).
    MessagesRemoved { from: usize, count: usize },
    /// A summary was added to the compressed memory.
    MemoryCompressed(ChatMessage),
}

/// Collaborators shared by every session.
#[derive(Clone)]
pub struct SessionServices {
    pub messages: Arc<dyn MessageRepository>,
    pub configs: Arc<dyn SessionConfigRepository>,
    pub clients: Arc<dyn CompletionClientFactory>,
    /// Minimum interval between message-file rewrites during streaming.
    pub persist_debounce: Duration,
}

/// Where a streamed delta landed.
enum Folded {
    Appended(usize),
    Extended(usize),
}

pub struct SessionLifecycle {
    config: SessionConfig,
    messages: Vec<ChatMessage>,
    services: SessionServices,
    updater: SessionConfigUpdater,
    rng: Box<dyn RngCore + Send + Sync>,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
    state: SendState,
}

impl std::fmt::Debug for SessionLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLifecycle")
            .field("config", &self.config)
            .field("messages", &self.messages)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SessionLifecycle {
    /// Loads the stored messages of `config`'s session.
    pub async fn load(config: SessionConfig, services: SessionServices) -> Result<Self> {
        let messages = services.messages.load(&config.session_id).await?;
        tracing::info!(
            "Loaded session {} ({} messages)",
            config.session_id,
            messages.len()
        );

        Ok(Self {
            updater: SessionConfigUpdater::new(services.configs.clone()),
            config,
            messages,
            services,
            rng: Box::new(StdRng::from_entropy()),
            events: None,
            state: SendState::Idle,
        })
    }

    /// Replaces the random source used for system-message sampling.
    pub fn with_rng(mut self, rng: impl RngCore + Send + Sync + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn set_event_sender(&mut self, sender: Option<mpsc::UnboundedSender<SessionEvent>>) {
        self.events = sender;
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn state(&self) -> SendState {
        self.state
    }

    /// Applies and persists a settings change.
    pub async fn update_config<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut SessionConfig) -> Result<()>,
    {
        self.config = self.updater.update(&self.config.session_id, f).await?;
        Ok(())
    }

    /// Sends a user message and streams the reply into the list.
    ///
    /// Returns `Ok(None)` without side effects when `content` is blank,
    /// otherwise the last message after the stream finished.
    pub async fn send_message(&mut self, content: &str) -> Result<Option<ChatMessage>> {
        if content.trim().is_empty() {
            return Ok(None);
        }

        let user_message = ChatMessage::with_created(
            MessageRole::User,
            content,
            self.next_created(now_millis()),
        );
        let request = CompletionRequest {
            model: self.config.model.clone(),
            messages: build_request_messages(
                &self.config,
                &self.messages,
                &user_message,
                &mut *self.rng,
            ),
            temperature: self.config.temperature,
        };
        tracing::debug!(
            "Sending to {} with {} context messages",
            request.model,
            request.messages.len()
        );

        self.messages.push(user_message.clone());
        self.emit(SessionEvent::MessageAppended(user_message));
        self.persist_messages().await;

        self.set_state(SendState::AwaitingFirstDelta);
        if let Err(e) = self.stream_reply(request).await {
            tracing::error!("Send failed for session {}: {}", self.config.session_id, e);
            self.set_state(SendState::Failed);
            return Err(e);
        }
        self.set_state(SendState::Finished);

        if let Err(e) = self.compress_history().await {
            tracing::warn!("History compression failed: {}", e);
        }

        Ok(self.messages.last().cloned())
    }

    async fn stream_reply(&mut self, request: CompletionRequest) -> Result<()> {
        let client = self
            .services
            .clients
            .client_for(&self.config.api_key, &self.config.api_host)?;
        let mut stream = client.stream(request).await?;

        let mut throttle = PersistThrottle::new(self.services.persist_debounce);
        let mut dirty = false;
        let mut outcome = Ok(());
        // Entry appended by this stream; id-less deltas fold into it.
        let mut reply: Option<usize> = None;

        while let Some(item) = stream.next().await {
            let delta = match item {
                Ok(delta) => delta,
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            };
            if self.state == SendState::AwaitingFirstDelta {
                self.set_state(SendState::Streaming);
            }

            let text = delta.content.clone();
            let now = Instant::now();
            match self.fold_delta(delta, reply) {
                Folded::Appended(index) => {
                    reply = Some(index);
                    let appended = self.messages[index].clone();
                    self.emit(SessionEvent::MessageAppended(appended));
                    throttle.record(now);
                    self.persist_messages().await;
                    dirty = false;
                }
                Folded::Extended(index) => {
                    reply = Some(index);
                    if !text.is_empty() {
                        self.emit(SessionEvent::MessageExtended { index, delta: text });
                    }
                    dirty = true;
                    if throttle.try_acquire(now) {
                        self.persist_messages().await;
                        dirty = false;
                    }
                }
            }
        }

        if dirty {
            self.persist_messages().await;
        }
        outcome
    }

    /// Folds a delta into the list.
    ///
    /// A delta extends the last message when the ids match. A delta without
    /// an id extends `reply`, the entry the current stream appended, so a
    /// host that omits ids still yields one message per response. The user
    /// message is never extended.
    fn fold_delta(&mut self, delta: CompletionDelta, reply: Option<usize>) -> Folded {
        let target = if delta.id.is_empty() {
            reply
        } else {
            self.messages
                .len()
                .checked_sub(1)
                .filter(|&last| self.messages[last].id == delta.id)
        };

        if let Some(index) = target {
            let message = &mut self.messages[index];
            message.content.push_str(&delta.content);
            if delta.finish_reason.is_some() {
                message.finish_reason = delta.finish_reason;
            }
            if delta.usage.is_some() {
                message.usage = delta.usage;
            }
            if message.model.is_none() {
                message.model = delta.model;
            }
            return Folded::Extended(index);
        }

        let created = self.next_created(now_millis());
        let mut message = ChatMessage::with_created(
            delta.role.unwrap_or(MessageRole::Assistant),
            delta.content,
            created,
        )
        .with_id(delta.id);
        message.model = delta.model.or_else(|| Some(self.config.model.clone()));
        message.finish_reason = delta.finish_reason;
        message.usage = delta.usage;
        self.messages.push(message);
        Folded::Appended(self.messages.len() - 1)
    }

    /// Summarizes the newest assistant message that left the memory window.
    ///
    /// Returns the new summary, or `None` when nothing was due.
    pub async fn compress_history(&mut self) -> Result<Option<ChatMessage>> {
        if !self.config.should_compress(self.messages.len()) {
            return Ok(None);
        }
        let Some(index) = compression_candidate(&self.config, &self.messages) else {
            tracing::debug!("No message to compress");
            return Ok(None);
        };
        let source = self.messages[index].clone();
        if self.config.has_compressed_memory_for(source.created) {
            tracing::debug!("Message {} already compressed", source.identity());
            return Ok(None);
        }

        let client = self
            .services
            .clients
            .client_for(&self.config.api_key, &self.config.api_host)?;
        let request = CompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(self.config.compression_instruction()),
                source.clone(),
            ],
            temperature: COMPRESSION_TEMPERATURE,
        };

        let mut summary = client.complete(request).await?;
        summary.created = source.created;
        tracing::info!(
            "Compressed message {} into {} chars",
            source.identity(),
            summary.content.len()
        );

        let added = summary.clone();
        self.change_config(move |config| config.push_compressed_memory(added.clone()))
            .await;
        self.emit(SessionEvent::MemoryCompressed(summary.clone()));
        Ok(Some(summary))
    }

    /// Removes the message at `index` and its compressed-memory entry.
    pub async fn delete_message(&mut self, index: usize) -> Result<ChatMessage> {
        if index >= self.messages.len() {
            return Err(VanilleError::not_found("Message", index.to_string()));
        }
        let removed = self.messages.remove(index);
        self.emit(SessionEvent::MessagesRemoved {
            from: index,
            count: 1,
        });
        self.persist_messages().await;

        let created = removed.created;
        if self.config.has_compressed_memory_for(created) {
            self.change_config(move |config| {
                config.remove_compressed_memory_for(created);
            })
            .await;
        }
        Ok(removed)
    }

    /// Drops the message at `index` and everything after it, then sends its
    /// content again.
    pub async fn resend_message(&mut self, index: usize) -> Result<Option<ChatMessage>> {
        if index >= self.messages.len() {
            return Err(VanilleError::not_found("Message", index.to_string()));
        }
        let content = self.messages[index].content.clone();

        let removed: Vec<ChatMessage> = self.messages.drain(index..).collect();
        self.emit(SessionEvent::MessagesRemoved {
            from: index,
            count: removed.len(),
        });
        self.persist_messages().await;

        let stale: Vec<i64> = removed
            .iter()
            .map(|m| m.created)
            .filter(|created| self.config.has_compressed_memory_for(*created))
            .collect();
        if !stale.is_empty() {
            self.change_config(move |config| {
                for created in &stale {
                    config.remove_compressed_memory_for(*created);
                }
            })
            .await;
        }

        self.send_message(&content).await
    }

    /// Removes every message and every compressed-memory entry.
    pub async fn clear_messages(&mut self) {
        let count = self.messages.len();
        self.messages.clear();
        self.emit(SessionEvent::MessagesRemoved { from: 0, count });
        self.persist_messages().await;

        if !self.config.compressed_memory_list.is_empty() {
            self.change_config(|config| config.compressed_memory_list.clear())
                .await;
        }
    }

    /// Timestamp for a new message, kept strictly after the last one so
    /// timestamps stay unique within the session.
    fn next_created(&self, now: i64) -> i64 {
        match self.messages.last() {
            Some(last) if last.created >= now => last.created + 1,
            _ => now,
        }
    }

    async fn persist_messages(&self) {
        if let Err(e) = self
            .services
            .messages
            .save(&self.config.session_id, &self.messages)
            .await
        {
            tracing::error!(
                "Failed to persist messages of session {}: {}",
                self.config.session_id,
                e
            );
        }
    }

    /// Applies a change locally and to the stored config; storage failures are logged.
    async fn change_config<F>(&mut self, f: F)
    where
        F: Fn(&mut SessionConfig),
    {
        f(&mut self.config);
        let session_id = self.config.session_id.clone();
        match self
            .updater
            .update(&session_id, |config| {
                f(config);
                Ok(())
            })
            .await
        {
            Ok(saved) => self.config = saved,
            Err(e) => tracing::error!("Failed to persist session {}: {}", session_id, e),
        }
    }

    fn set_state(&mut self, state: SendState) {
        self.state = state;
        self.emit(SessionEvent::StateChanged(state));
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(sender) = &self.events {
            // The receiver may have gone away; the session keeps working.
            let _ = sender.send(event);
        }
    }
}
