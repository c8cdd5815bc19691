//! Storage primitives shared by the repositories.

mod atomic_json;
mod settings_storage;

pub use atomic_json::{AtomicJsonError, AtomicJsonFile};
pub use settings_storage::{
    ACTIVE_SESSION_KEY, CHAT_SESSIONS_KEY, GLOBAL_CONFIG_KEY, SettingsStorage,
};
