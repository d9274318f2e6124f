//! Key-value persistence port used by the session and cart stores.
//!
//! Stores never touch the filesystem directly: they read and write string
//! values through a [`Storage`] implementation chosen at startup.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use parking_lot::{Mutex, RwLock};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

/// Key holding the bearer token as a plain string.
pub const TOKEN_KEY: &str = "token";
/// Key holding the JSON-serialized current user.
pub const USER_KEY: &str = "user";
/// Key holding the JSON-serialized cart items.
pub const CART_KEY: &str = "marketplace_cart";

/// File name used by [`FileStorage`] inside its directory.
pub const STORAGE_FILE: &str = "storage.json";

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error on {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The backing file does not contain a JSON object of strings.
    #[error("storage file {path} is corrupt: {source}")]
    Corrupt {
        /// File being parsed.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// Encoding the store contents failed.
    #[error("failed to encode storage contents: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Client-scoped string key-value store.
pub trait Storage: Send + Sync {
    /// Read a value, `None` when the key is absent.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    /// Delete a key. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> StorageResult<()>;
    /// Whether writes outlive the process.
    fn is_persistent(&self) -> bool {
        true
    }
}

/// Storage for hosts without persistent storage: reads nothing, drops writes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStorage;

impl Storage for NoopStorage {
    fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> StorageResult<()> {
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        false
    }
}

/// In-process map, useful for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no keys are held.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        false
    }
}

/// Storage mirrored to a single JSON object file.
///
/// Every read goes to disk and every write rewrites the whole file through a
/// temporary file in the same directory, so concurrent clients see
/// last-writer-wins semantics and never a half-written file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Storage backed by `dir/storage.json`. The directory is created on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::at_path(dir.as_ref().join(STORAGE_FILE))
    }

    /// Storage backed by an explicit file path.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> StorageResult<BTreeMap<String, String>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    // A corrupt file must not block writes; the next write replaces it.
    fn read_entries_for_update(&self) -> StorageResult<BTreeMap<String, String>> {
        match self.read_entries() {
            Err(err @ StorageError::Corrupt { .. }) => {
                warn!("discarding unreadable storage file: {err}");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let io_err = |source: io::Error| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(io_err)?;

        let serialized = serde_json::to_vec_pretty(entries)?;
        let mut file = NamedTempFile::new_in(&dir).map_err(io_err)?;
        file.write_all(&serialized).map_err(io_err)?;
        file.flush().map_err(io_err)?;
        file.persist(&self.path).map_err(|err| io_err(err.error))?;
        debug!("wrote {} storage keys to {}", entries.len(), self.path.display());
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        let mut entries = self.read_entries_for_update()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let _guard = self.write_lock.lock();
        let mut entries = self.read_entries_for_update()?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_entries(&entries)
    }
}
