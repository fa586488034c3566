//! Durable key/value storage backing the session store

use crate::errors::{AppError, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Persistent string-keyed storage.
///
/// `set_all` must write every entry or none of them.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set_all(&self, entries: &[(&str, &str)]) -> Result<()>;

    /// Remove every key. Clearing empty storage is not an error.
    fn clear(&self) -> Result<()>;
}

/// In-process storage; contents die with the value
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set_all(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut guard = self.lock();
        for (key, value) in entries {
            guard.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.lock().clear();
        Ok(())
    }
}

/// JSON object file, replaced atomically on every write
#[derive(Debug)]
pub struct FileSessionStorage {
    path: PathBuf,
    // Serialises read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file contents; `None` when no session has been written
    fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage {
                message: format!("Failed to read {}: {}", self.path.display(), e),
            }),
        }
    }

    fn parse_map(&self, bytes: &[u8]) -> Result<BTreeMap<String, String>> {
        serde_json::from_slice(bytes).map_err(|e| AppError::Storage {
            message: format!("Failed to parse {}: {}", self.path.display(), e),
        })
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        match self.read_bytes()? {
            Some(bytes) => self.parse_map(&bytes),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Write through a temp file in the same directory and rename over the target
    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let json = serde_json::to_vec_pretty(map).map_err(|e| AppError::Storage {
            message: format!("Failed to serialize session: {}", e),
        })?;

        let mut temp_file = tempfile::NamedTempFile::new_in(&parent)?;
        temp_file.write_all(&json)?;
        temp_file.as_file().sync_all()?;
        temp_file.persist(&self.path).map_err(|e| AppError::Storage {
            message: format!("Failed to persist {}: {}", self.path.display(), e.error),
        })?;

        debug!(path = %self.path.display(), keys = map.len(), "Session storage written");
        Ok(())
    }
}

impl SessionStorage for FileSessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.remove(key))
    }

    fn set_all(&self, entries: &[(&str, &str)]) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        // A corrupt file is replaced rather than blocking a fresh login.
        let mut map = match self.read_bytes()? {
            Some(bytes) => self.parse_map(&bytes).unwrap_or_else(|e| {
                warn!(error = %e, "Replacing corrupt session storage");
                BTreeMap::new()
            }),
            None => BTreeMap::new(),
        };
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        self.write_map(&map)
    }

    fn clear(&self) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session storage cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
