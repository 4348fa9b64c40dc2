use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage lock error: {0}")]
    Lock(String),
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed stored value: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Synchronous string-keyed store holding serialized JSON values.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: String) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// Reads and decodes `key`. Absent keys are `Ok(None)`, malformed JSON is an error.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get_item(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    store.set_item(key, serde_json::to_string(value)?)
}

fn lock_error<E: std::fmt::Display>(e: E) -> StorageError {
    let error_msg = format!("Failed to acquire storage lock: {}", e);
    tracing::error!("{}", error_msg);
    StorageError::Lock(error_msg)
}

/// Process-local store; contents are lost on exit.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for InMemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.lock().map_err(lock_error)?;
        let result = items.get(key).cloned();
        if result.is_some() {
            tracing::debug!("Storage hit for key: {}", key);
        } else {
            tracing::debug!("Storage miss for key: {}", key);
        }
        Ok(result)
    }

    fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(lock_error)?;
        items.insert(key.to_string(), value);
        tracing::debug!("Stored value for key: {}", key);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(lock_error)?;
        if items.remove(key).is_some() {
            tracing::debug!("Removed stored value for key: {}", key);
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(lock_error)?;
        let size = items.len();
        items.clear();
        tracing::info!("Cleared storage ({} entries)", size);
        Ok(())
    }
}

/// Store backed by one JSON object on disk, rewritten after every mutation.
pub struct FileStore {
    path: PathBuf,
    items: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Opens `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let items: HashMap<String, String> = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            "Opened file storage at {} ({} entries)",
            path.display(),
            items.len()
        );

        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, items: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec(items)?)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.lock().map_err(lock_error)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(lock_error)?;
        items.insert(key.to_string(), value);
        self.flush(&items)?;
        tracing::debug!("Persisted key {} to {}", key, self.path.display());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(lock_error)?;
        if items.remove(key).is_some() {
            self.flush(&items)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(lock_error)?;
        items.clear();
        self.flush(&items)
    }
}
