//! Domain layer of the Vanille chat client.
//!
//! Holds the message and session models, the request-context rules, and the
//! traits through which storage and the completion service are reached.

pub mod completion;
pub mod config;
pub mod error;
pub mod global;
pub mod message;
pub mod session;

// Re-export common error type
pub use error::{Result, VanilleError};
pub use message::{ChatMessage, MessageRole, Usage};
