//! Session persistence traits.
//!
//! Defines the interfaces for storing per-session message lists and the
//! session configuration blob.

use super::config::SessionConfig;
use crate::error::Result;
use crate::message::ChatMessage;
use async_trait::async_trait;

/// Storage of the ordered message list of each session.
///
/// The list is rewritten wholesale on every save; there is no incremental
/// append format.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Loads the messages of a session.
    ///
    /// # Returns
    ///
    /// - `Ok(messages)`: Stored messages in order; empty when the file is
    ///   missing or unreadable
    /// - `Err(_)`: Storage could not be reached at all
    async fn load(&self, session_id: &str) -> Result<Vec<ChatMessage>>;

    /// Replaces the stored messages of a session.
    async fn save(&self, session_id: &str, messages: &[ChatMessage]) -> Result<()>;

    /// Removes the stored messages of a session (no-op when absent).
    async fn delete(&self, session_id: &str) -> Result<()>;
}

/// An abstract repository for session configurations.
///
/// Implementations keep configs in creation order and track which session
/// is active.
#[async_trait]
pub trait SessionConfigRepository: Send + Sync {
    /// Lists all session configs in creation order.
    async fn list_all(&self) -> Result<Vec<SessionConfig>>;

    /// Finds a session config by id.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(config))`: Config found
    /// - `Ok(None)`: No such session
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, session_id: &str) -> Result<Option<SessionConfig>>;

    /// Inserts or replaces a config; new configs are appended.
    async fn save(&self, config: &SessionConfig) -> Result<()>;

    /// Deletes a config (no-op when absent).
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// Gets the ID of the currently active session.
    async fn get_active_session_id(&self) -> Result<Option<String>>;

    /// Sets the ID of the currently active session.
    async fn set_active_session_id(&self, session_id: &str) -> Result<()>;
}
