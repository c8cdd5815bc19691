//! Completion client interface.
//!
//! The remote chat-completion service is consumed through [`CompletionClient`];
//! `vanille-interaction` provides the HTTP implementation.

use crate::error::Result;
use crate::message::{ChatMessage, MessageRole, Usage};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;

/// A chat-completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
}

/// One incremental chunk of a streamed response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionDelta {
    /// Completion id shared by every chunk of one response.
    pub id: String,
    pub role: Option<MessageRole>,
    pub content: String,
    pub model: Option<String>,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

/// Stream of deltas; ends after the chunk carrying a finish reason.
pub type DeltaStream = BoxStream<'static, Result<CompletionDelta>>;

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Issues a non-streaming request and returns the single result.
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage>;

    /// Issues a streaming request.
    ///
    /// Errors before the first chunk are returned directly; errors after
    /// that are yielded as stream items.
    async fn stream(&self, request: CompletionRequest) -> Result<DeltaStream>;
}

/// Builds a client for a session's credentials.
///
/// Sessions may carry different keys and hosts, so a client is obtained per
/// request rather than shared.
pub trait CompletionClientFactory: Send + Sync {
    fn client_for(&self, api_key: &str, api_host: &str) -> Result<Arc<dyn CompletionClient>>;
}
