//! Session domain module.
//!
//! # Module Structure
//!
//! - `config`: Per-session settings (`SessionConfig`) and compressed-memory rules
//! - `context`: Outgoing request assembly (system sampling, memory window)
//! - `repository`: Persistence traits for messages and session configs

mod config;
mod context;
mod repository;

pub use config::{
    COMPRESSED_MEMORY_HEADING, DEFAULT_COMPRESS_MEMORY_COUNT, DEFAULT_COMPRESS_MEMORY_METHOD,
    DEFAULT_MEMORY_COUNT, DEFAULT_MODEL, DEFAULT_SESSION_NAME, DEFAULT_TEMPERATURE, SessionConfig,
};
pub use context::{build_request_messages, compression_candidate, select_system_messages};
pub use repository::{MessageRepository, SessionConfigRepository};
