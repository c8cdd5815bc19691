pub mod chat;
pub mod config;
pub mod models;
pub mod session;

use anyhow::{Result, bail};
use vanille_application::ChatApp;
use vanille_core::session::SessionConfig;

/// Resolves a session by 1-based list number, exact id or unique id prefix.
pub async fn resolve_session(app: &ChatApp, key: &str) -> Result<SessionConfig> {
    let sessions = app.sessions.list_sessions().await?;
    match select_session(&sessions, key) {
        Ok(config) => Ok(config.clone()),
        Err(reason) => bail!(reason),
    }
}

fn select_session<'a>(sessions: &'a [SessionConfig], key: &str) -> Result<&'a SessionConfig, String> {
    let key = key.trim();
    if let Ok(number) = key.parse::<usize>() {
        if let Some(config) = number.checked_sub(1).and_then(|i| sessions.get(i)) {
            return Ok(config);
        }
    }
    if let Some(config) = sessions.iter().find(|c| c.session_id == key) {
        return Ok(config);
    }

    let matches: Vec<&SessionConfig> = sessions
        .iter()
        .filter(|c| !key.is_empty() && c.session_id.starts_with(key))
        .collect();
    match matches.as_slice() {
        [only] => Ok(only),
        [] => Err(format!("No session matches '{key}'")),
        _ => Err(format!("'{key}' matches {} sessions", matches.len())),
    }
}

/// First characters of a session id, enough to tell sessions apart.
pub fn short_id(session_id: &str) -> &str {
    session_id.get(..8).unwrap_or(session_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sessions() -> Vec<SessionConfig> {
        ["abc-1", "abd-2", "xyz-3"]
            .iter()
            .map(|id| {
                let mut config = SessionConfig::new(*id);
                config.session_id = id.to_string();
                config
            })
            .collect()
    }

    #[test]
    fn select_by_number_id_and_prefix() {
        let sessions = sessions();
        assert_eq!(select_session(&sessions, "2").unwrap().session_id, "abd-2");
        assert_eq!(select_session(&sessions, "xyz-3").unwrap().session_id, "xyz-3");
        assert_eq!(select_session(&sessions, "abc").unwrap().session_id, "abc-1");
    }

    #[test]
    fn ambiguous_or_missing_keys_fail() {
        let sessions = sessions();
        assert!(select_session(&sessions, "ab").unwrap_err().contains("matches 2"));
        assert!(select_session(&sessions, "nope").is_err());
        assert!(select_session(&sessions, "0").is_err());
    }

    #[test]
    fn short_id_handles_short_input() {
        assert_eq!(short_id("1234567890"), "12345678");
        assert_eq!(short_id("abc"), "abc");
    }
}
