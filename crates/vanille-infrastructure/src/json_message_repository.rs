//! File-per-session message storage.

use crate::storage::AtomicJsonFile;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use vanille_core::ChatMessage;
use vanille_core::error::Result;
use vanille_core::session::MessageRepository;

/// Stores each session's messages as one JSON array.
///
/// Directory structure:
/// ```text
/// messages_dir/
/// ├── message_<session-id-1>.json
/// └── message_<session-id-2>.json
/// ```
pub struct JsonMessageRepository {
    messages_dir: PathBuf,
}

impl JsonMessageRepository {
    pub fn new(messages_dir: impl Into<PathBuf>) -> Self {
        Self {
            messages_dir: messages_dir.into(),
        }
    }

    pub fn messages_dir(&self) -> &Path {
        &self.messages_dir
    }

    fn file_for(&self, session_id: &str) -> AtomicJsonFile<Vec<ChatMessage>> {
        AtomicJsonFile::new(self.messages_dir.join(file_name(session_id)))
    }
}

/// File name for a session, with path separators neutralized.
fn file_name(session_id: &str) -> String {
    let safe: String = session_id
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!("message_{}.json", safe)
}

#[async_trait]
impl MessageRepository for JsonMessageRepository {
    async fn load(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let file = self.file_for(session_id);
        match file.load() {
            Ok(Some(messages)) => {
                tracing::debug!(
                    "Loaded {} messages for session {}",
                    messages.len(),
                    session_id
                );
                Ok(messages)
            }
            Ok(None) => Ok(Vec::new()),
            Err(e) => {
                // Unreadable files are treated as empty; the next save replaces them.
                tracing::warn!(
                    "Failed to load messages from {}: {}",
                    file.path().display(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, session_id: &str, messages: &[ChatMessage]) -> Result<()> {
        if session_id.is_empty() {
            return Err(vanille_core::VanilleError::invalid_input(
                "session id must not be empty",
            ));
        }
        self.file_for(session_id).save(&messages.to_vec())?;
        tracing::trace!(
            "Saved {} messages for session {}",
            messages.len(),
            session_id
        );
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.file_for(session_id).remove()?;
        Ok(())
    }
}
