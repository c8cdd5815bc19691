//! Session application services.
//!
//! - `lifecycle`: send / stream / compress / delete / resend of one session
//! - `manager`: session list, active session, create / switch / delete
//! - `persist`: debounce of message-file rewrites while streaming
//! - `updater`: find → update → save of session configs

mod lifecycle;
mod manager;
mod persist;
mod updater;

pub use lifecycle::{
    COMPRESSION_TEMPERATURE, SendState, SessionEvent, SessionLifecycle, SessionServices,
};
pub use manager::ChatSessionManager;
pub use persist::PersistThrottle;
pub use updater::SessionConfigUpdater;
