//! Durable key-value storage for the analytics queue.
//!
//! The interface mirrors a browser's `localStorage`: string keys, string
//! values, synchronous calls.

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::AnalyticsError;

/// Key holding the JSON-encoded event queue.
pub const QUEUE_KEY: &str = "analytics_queue";
/// Key holding the consent decision (`"granted"` or `"denied"`).
pub const CONSENT_KEY: &str = "analytics_consent";

pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, AnalyticsError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), AnalyticsError>;
    fn remove_item(&self, key: &str) -> Result<(), AnalyticsError>;
}

/// Process-local storage. Contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, AnalyticsError> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), AnalyticsError> {
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), AnalyticsError> {
        self.items.lock().remove(key);
        Ok(())
    }
}

/// All keys in one JSON object file.
///
/// Writes go to a sibling temp file that is then renamed over the original,
/// so a crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, AnalyticsError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), AnalyticsError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec(items)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Read-modify-write. An unreadable file is replaced rather than
    /// blocking every later write.
    fn update<F>(&self, apply: F) -> Result<(), AnalyticsError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.lock.lock();
        let mut items = match self.read_all() {
            Ok(items) => items,
            Err(AnalyticsError::Serialization(e)) => {
                log::warn!(
                    "Overwriting corrupt analytics storage {}: {}",
                    self.path.display(),
                    e
                );
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        apply(&mut items);
        self.write_all(&items)
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, AnalyticsError> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), AnalyticsError> {
        self.update(|items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), AnalyticsError> {
        self.update(|items| {
            items.remove(key);
        })
    }
}
