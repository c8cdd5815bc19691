//! Per-session configuration.

use crate::global::GlobalConfig;
use crate::message::ChatMessage;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SESSION_NAME: &str = "New conversation";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-1106";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MEMORY_COUNT: usize = 3;
pub const DEFAULT_COMPRESS_MEMORY_COUNT: usize = 8;
pub const DEFAULT_COMPRESS_MEMORY_METHOD: &str =
    "Condense the messages you receive as much as possible";

/// Heading of the synthetic system message that carries compressed history.
pub const COMPRESSED_MEMORY_HEADING: &str = "Summary of earlier messages";

/// Settings of a single conversation.
///
/// Persisted as one entry of the `chat_sessions` settings blob. Every field
/// write goes through `SessionConfigUpdater`, which persists immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub session_id: String,
    pub session_name: String,
    /// System prompts, each sampled against its `probability_to_use` per send.
    pub system_messages: Vec<ChatMessage>,
    pub temperature: f64,
    /// Number of recent messages resent as context.
    pub memory_count: usize,
    pub memory_enable: bool,
    /// Upper bound of `compressed_memory_list`.
    pub compress_memory_count: usize,
    pub compress_memory_enable: bool,
    /// User-authored instruction for how history is summarized.
    pub compress_memory_method: String,
    /// Summaries in append order; each carries the timestamp of its source message.
    pub compressed_memory_list: Vec<ChatMessage>,
    pub model: String,
    pub api_key: String,
    pub api_host: String,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// RFC 3339 time of the last persisted change.
    pub updated_at: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_NAME)
    }
}

impl SessionConfig {
    /// Creates a session config with a fresh id and default settings.
    pub fn new(session_name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            session_name: session_name.into(),
            system_messages: Vec::new(),
            temperature: DEFAULT_TEMPERATURE,
            memory_count: DEFAULT_MEMORY_COUNT,
            memory_enable: true,
            compress_memory_count: DEFAULT_COMPRESS_MEMORY_COUNT,
            compress_memory_enable: true,
            compress_memory_method: DEFAULT_COMPRESS_MEMORY_METHOD.to_string(),
            compressed_memory_list: Vec::new(),
            model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
            api_host: String::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Fills an empty API key or host from the first global entry.
    pub fn fill_credentials(&mut self, global: &GlobalConfig) {
        if self.api_key.is_empty() {
            if let Some(key) = global.api_keys.first() {
                self.api_key = key.clone();
            }
        }
        if self.api_host.is_empty() {
            if let Some(host) = global.api_hosts.first() {
                self.api_host = host.clone();
            }
        }
    }

    /// Number of persisted messages resent with each request.
    pub fn memory_window(&self) -> usize {
        if self.memory_enable {
            self.memory_count
        } else {
            0
        }
    }

    /// Whether a store of `message_count` messages is due for compression.
    pub fn should_compress(&self, message_count: usize) -> bool {
        self.compress_memory_enable && message_count > self.memory_window() + 1
    }

    /// Appends a summary, evicting the oldest entries while over the cap.
    pub fn push_compressed_memory(&mut self, summary: ChatMessage) {
        self.compressed_memory_list.push(summary);
        self.trim_compressed_memory();
    }

    /// Changes the summary cap and drops the oldest summaries above it.
    pub fn set_compress_memory_count(&mut self, count: usize) {
        self.compress_memory_count = count;
        self.trim_compressed_memory();
    }

    /// Drops the oldest summaries while the list is over the cap.
    pub fn trim_compressed_memory(&mut self) {
        let excess = self
            .compressed_memory_list
            .len()
            .saturating_sub(self.compress_memory_count);
        self.compressed_memory_list.drain(..excess);
    }

    /// Whether a summary tied to the source timestamp exists.
    pub fn has_compressed_memory_for(&self, created: i64) -> bool {
        self.compressed_memory_list.iter().any(|m| m.created == created)
    }

    /// Removes the first summary whose timestamp equals `created`.
    pub fn remove_compressed_memory_for(&mut self, created: i64) -> bool {
        match self
            .compressed_memory_list
            .iter()
            .position(|m| m.created == created)
        {
            Some(index) => {
                self.compressed_memory_list.remove(index);
                true
            }
            None => false,
        }
    }

    /// Text of the compressed-memory system message, if any summary has content.
    pub fn compressed_memory_summary(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .compressed_memory_list
            .iter()
            .map(|m| m.content.as_str())
            .filter(|c| !c.is_empty())
            .collect();

        if parts.is_empty() {
            return None;
        }
        Some(format!("{}: {}", COMPRESSED_MEMORY_HEADING, parts.join("; ")))
    }

    /// Instruction sent ahead of the message being compressed.
    pub fn compression_instruction(&self) -> String {
        format!(
            "Compress the following message. Follow these instructions and do not repeat \
             them in the result: {{{}}}. The message to compress is:",
            self.compress_memory_method
        )
    }
}
