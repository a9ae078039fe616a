//! Key/value persistence backends.
//!
//! The engine only needs `get`/`set`/`remove` by string key. A missing or
//! failing backend never stops the game: [`Persistence`] logs the problem
//! and the session carries on in memory.

use std::collections::HashMap;

use tracing::warn;

use crate::error::StorageError;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Process-lifetime store. Also the test double for everything else.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One file per key under a directory (native builds).
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    /// Creates the directory if needed.
    pub fn open(dir: impl Into<std::path::PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> std::path::PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Backend(e.to_string())),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        // Write-then-rename so a crash mid-write leaves the old save intact.
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(|e| StorageError::Backend(e.to_string()))?;
        std::fs::rename(&tmp, &path).map_err(|e| StorageError::Backend(e.to_string()))
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Backend(e.to_string())),
        }
    }
}

/// Browser `localStorage`. Private browsing modes may block it entirely,
/// in which case every call reports [`StorageError::Unavailable`].
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStorage;

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .ok_or(StorageError::Unavailable)
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| StorageError::Backend(format!("{e:?}")))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Backend(format!("{e:?}")))
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|e| StorageError::Backend(format!("{e:?}")))
    }
}

/// Optional backend plus the degrade-to-memory policy.
pub struct Persistence {
    backend: Option<Box<dyn KeyValueStore>>,
    warned: bool,
}

impl Persistence {
    pub fn new(backend: Option<Box<dyn KeyValueStore>>) -> Self {
        if backend.is_none() {
            warn!("no persistent store configured; progress will not survive a restart");
        }
        Self {
            backend,
            warned: false,
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub fn get(&mut self, key: &str) -> Result<Option<String>, StorageError> {
        let result = match &self.backend {
            Some(b) => b.get(key),
            None => Err(StorageError::Unavailable),
        };
        self.observe(result)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let result = match &mut self.backend {
            Some(b) => b.set(key, value),
            None => Err(StorageError::Unavailable),
        };
        self.observe(result)
    }

    pub fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let result = match &mut self.backend {
            Some(b) => b.remove(key),
            None => Err(StorageError::Unavailable),
        };
        self.observe(result)
    }

    /// Warn on the first failure of a streak so an unavailable store does
    /// not flood the log every autosave.
    fn observe<T>(&mut self, result: Result<T, StorageError>) -> Result<T, StorageError> {
        match &result {
            Ok(_) => self.warned = false,
            Err(StorageError::Unavailable) if self.backend.is_none() => {}
            Err(e) => {
                if !self.warned {
                    warn!(error = %e, "persistent store failed; continuing in memory");
                    self.warned = true;
                }
            }
        }
        result
    }
}
