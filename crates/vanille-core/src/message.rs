//! Chat message types.
//!
//! A [`ChatMessage`] is the unit stored in a session's message file, sent to
//! the completion API, and kept as a compressed-memory summary.

use serde::{Deserialize, Serialize};

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
    /// System-generated message (instructions, summaries).
    System,
}

impl MessageRole {
    /// Wire name used by OpenAI-compatible APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token accounting returned by the completion API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

fn default_probability() -> f64 {
    1.0
}

/// A single message in a conversation.
///
/// Identity is the explicit `id` when one was supplied (remote completion
/// ids such as `chatcmpl-...`), otherwise the creation timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Explicit identifier; empty when identity falls back to `created`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub created: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Inclusion probability for system messages, in `[0, 1]`.
    #[serde(default = "default_probability")]
    pub probability_to_use: f64,
}

impl ChatMessage {
    /// Creates a message stamped with the current time.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self::with_created(role, content, now_millis())
    }

    /// Creates a message with an explicit creation timestamp.
    pub fn with_created(role: MessageRole, content: impl Into<String>, created: i64) -> Self {
        Self {
            id: String::new(),
            role,
            content: content.into(),
            created,
            name: None,
            model: None,
            finish_reason: None,
            usage: None,
            probability_to_use: default_probability(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Sets the explicit identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the inclusion probability, clamped to `[0, 1]`.
    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability_to_use = probability.clamp(0.0, 1.0);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Returns the message identity.
    pub fn identity(&self) -> String {
        if self.id.is_empty() {
            self.created.to_string()
        } else {
            self.id.clone()
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finish_reason.as_deref().is_some_and(|r| !r.is_empty())
    }
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
