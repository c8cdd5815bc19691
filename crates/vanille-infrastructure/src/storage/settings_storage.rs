//! Keyed settings blob.
//!
//! One JSON object on disk, each top-level key holding an independently
//! typed value (all session configs, global credentials, active session).
//! Reads and writes to the same file are serialized in-process by a mutex
//! and across processes by the file lock in [`AtomicJsonFile::update`].

use super::atomic_json::{AtomicJsonError, AtomicJsonFile};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value as JsonValue};
use std::path::PathBuf;
use std::sync::Mutex;

pub const CHAT_SESSIONS_KEY: &str = "chat_sessions";
pub const GLOBAL_CONFIG_KEY: &str = "global_config";
pub const ACTIVE_SESSION_KEY: &str = "active_session";

pub struct SettingsStorage {
    file: AtomicJsonFile<Map<String, JsonValue>>,
    write_guard: Mutex<()>,
}

impl SettingsStorage {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: AtomicJsonFile::new(path),
            write_guard: Mutex::new(()),
        }
    }

    /// Reads and deserializes one key.
    ///
    /// Returns `Ok(None)` when the file or the key is absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AtomicJsonError> {
        let _guard = self.lock();
        let Some(mut map) = self.file.load()? else {
            return Ok(None);
        };

        match map.remove(key) {
            Some(JsonValue::Null) | None => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    /// Serializes a value under one key, leaving other keys untouched.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AtomicJsonError> {
        let value = serde_json::to_value(value)?;
        let _guard = self.lock();
        self.file.update(Map::new(), |map| {
            map.insert(key.to_string(), value);
        })
    }

    /// Read-modify-write of one key under the file lock.
    pub fn update<T, F, R>(&self, key: &str, f: F) -> Result<R, AtomicJsonError>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> R,
    {
        let _guard = self.lock();
        self.file
            .update(Map::new(), |map| -> Result<R, AtomicJsonError> {
                // Leave the stored value in place until the new one is ready.
                let mut current: T = match map.get(key) {
                    Some(JsonValue::Null) | None => T::default(),
                    Some(value) => serde_json::from_value(value.clone())?,
                };
                let result = f(&mut current);
                map.insert(key.to_string(), serde_json::to_value(&current)?);
                Ok(result)
            })?
    }

    /// Removes one key.
    pub fn remove(&self, key: &str) -> Result<(), AtomicJsonError> {
        let _guard = self.lock();
        self.file.update(Map::new(), |map| {
            map.remove(key);
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        // A poisoned guard protects no data; keep going.
        self.write_guard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
