//! Error types for the Vanille chat client.

use thiserror::Error;

/// A shared error type for the whole Vanille workspace.
///
/// Variants are structured so callers can branch on the failure kind
/// (e.g. a completion failure versus a storage failure) without parsing
/// messages. `From` conversions cover the common library errors.
#[derive(Error, Debug, Clone)]
pub enum VanilleError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", "SSE"
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote completion request failed
    #[error("Completion error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Completion {
        status: Option<u16>,
        message: String,
    },

    /// Remote completion request timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Invalid argument supplied by the caller
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VanilleError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Completion error
    pub fn completion(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Completion {
            status,
            message: message.into(),
        }
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error came from the remote completion service
    pub fn is_completion(&self) -> bool {
        matches!(self, Self::Completion { .. } | Self::Timeout(_))
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }
}

impl From<std::io::Error> for VanilleError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for VanilleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for VanilleError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for VanilleError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, VanilleError>`.
pub type Result<T> = std::result::Result<T, VanilleError>;
