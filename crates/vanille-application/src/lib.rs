//! Application layer of Vanille.
//!
//! Coordinates the domain rules in `vanille-core` with file storage and the
//! completion client: session lifecycle, session management and global
//! credentials.

pub mod app;
pub mod global_config_service;
pub mod session;

pub use app::ChatApp;
pub use global_config_service::GlobalConfigService;
pub use session::{ChatSessionManager, SendState, SessionEvent, SessionLifecycle};
