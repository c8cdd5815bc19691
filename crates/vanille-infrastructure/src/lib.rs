//! File-backed implementations of the `vanille-core` repository traits.

pub mod config_service;
pub mod json_message_repository;
pub mod paths;
pub mod settings_global_repository;
pub mod settings_session_repository;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::json_message_repository::JsonMessageRepository;
pub use crate::paths::VanillePaths;
pub use crate::settings_global_repository::SettingsGlobalConfigRepository;
pub use crate::settings_session_repository::SettingsSessionRepository;
