//! Atomic JSON file operations.
//!
//! Provides a thin layer for safe concurrent access to JSON data files.

use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use vanille_core::VanilleError;

/// Errors that can occur during atomic JSON operations.
#[derive(Debug, thiserror::Error)]
pub enum AtomicJsonError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Lock error: {0}")]
    Lock(String),
    #[error("Invalid path {}", .0.display())]
    InvalidPath(PathBuf),
}

impl From<AtomicJsonError> for VanilleError {
    fn from(e: AtomicJsonError) -> Self {
        match e {
            AtomicJsonError::Io(e) => e.into(),
            AtomicJsonError::Json(e) => e.into(),
            AtomicJsonError::Lock(message) => VanilleError::io(message),
            AtomicJsonError::InvalidPath(path) => {
                VanilleError::io(format!("invalid path {}", path.display()))
            }
        }
    }
}

/// A handle to a JSON file that is replaced atomically on save.
///
/// Provides:
/// - **Atomicity**: Updates are all-or-nothing via tmp file + atomic rename
/// - **Isolation**: `update` holds an exclusive file lock for read-modify-write
/// - **Durability**: Explicit fsync before rename
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a new atomic JSON file handle.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the JSON file and deserializes it.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub fn load(&self) -> Result<Option<T>, AtomicJsonError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let data: T = serde_json::from_str(&content)?;
        Ok(Some(data))
    }

    /// Saves data to the file atomically.
    pub fn save(&self, data: &T) -> Result<(), AtomicJsonError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json_string = serde_json::to_string_pretty(data)?;

        // Write to temporary file in the same directory
        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(json_string.as_bytes())?;

        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    /// Performs a locked read-modify-write.
    ///
    /// The update function receives the current data (or `default_value` when
    /// the file doesn't exist) and its return value is passed back to the
    /// caller once the modified data has been written.
    pub fn update<F, R>(&self, default_value: T, f: F) -> Result<R, AtomicJsonError>
    where
        F: FnOnce(&mut T) -> R,
    {
        let _lock = FileLock::acquire(&self.path)?;

        let mut data = self.load()?.unwrap_or(default_value);
        let result = f(&mut data);
        self.save(&data)?;

        Ok(result)
    }

    /// Removes the file; a missing file is not an error.
    pub fn remove(&self) -> Result<(), AtomicJsonError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Hidden sibling of the target, so the final rename stays on one filesystem.
    fn temp_path(&self) -> Result<PathBuf, AtomicJsonError> {
        match (self.path.parent(), self.path.file_name()) {
            (Some(parent), Some(name)) => {
                Ok(parent.join(format!(".{}.tmp", name.to_string_lossy())))
            }
            _ => Err(AtomicJsonError::InvalidPath(self.path.clone())),
        }
    }
}

/// A file lock guard that releases the lock when dropped.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, AtomicJsonError> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive().map_err(|e| {
                AtomicJsonError::Lock(format!("Failed to acquire lock: {}", e))
            })?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlock happens when the handle closes; the lock file itself is best effort.
        let _ = fs::remove_file(&self.lock_path);
    }
}
