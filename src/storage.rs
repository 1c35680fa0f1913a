//! Client-local key/value persistence.

use std::{
    collections::BTreeMap,
    fmt::Debug,
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// A synchronous string key/value store which outlives a single session,
/// e.g. a file in the user's home directory.
pub trait Storage: Debug + Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Things that can go wrong when touching a [`Storage`].
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Unable to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: io::Error,
    },
    #[error("{} doesn't contain a valid key/value document", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        error: serde_json::Error,
    },
    #[error("The storage lock was poisoned")]
    Poisoned,
}

/// An in-memory [`Storage`], forgotten when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self { MemoryStorage::default() }

    /// How many keys are currently set?
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries =
            self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries =
            self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries =
            self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// A [`Storage`] backed by a JSON document on disk.
///
/// Every write goes straight to the file, so the contents survive restarts
/// but are only visible on this machine.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        FileStorage {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path { &self.path }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new())
            },
            Err(error) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    error,
                })
            },
        };

        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&raw).map_err(|error| StorageError::Corrupt {
            path: self.path.clone(),
            error,
        })
    }

    fn write_all(
        &self,
        entries: &BTreeMap<String, String>,
    ) -> Result<(), StorageError> {
        let io_error = |error| StorageError::Io {
            path: self.path.clone(),
            error,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_error)?;
            }
        }

        // serializing a map of strings can't fail
        let json = serde_json::to_string_pretty(entries)
            .unwrap_or_else(|_| String::from("{}"));
        log::trace!("Writing {} keys to {}", entries.len(), self.path.display());

        // readers only ever see the old document or the new one
        let scratch = self.scratch_path();
        fs::write(&scratch, json).map_err(io_error)?;
        fs::rename(&scratch, &self.path).map_err(io_error)
    }

    fn scratch_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn update<F>(&self, mutate: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(StorageError::Corrupt { error, .. }) => {
                log::warn!(
                    "Replacing the unreadable contents of {}: {}",
                    self.path.display(),
                    error
                );
                BTreeMap::new()
            },
            Err(e) => return Err(e),
        };
        mutate(&mut entries);
        self.write_all(&entries)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut entries = self.read_all()?;
        Ok(entries.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();

        storage.set("token", "abc").unwrap();
        assert_eq!(storage.get("token").unwrap(), Some(String::from("abc")));

        storage.remove("token").unwrap();
        assert_eq!(storage.get("token").unwrap(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nope.json"));

        assert_eq!(storage.get("token").unwrap(), None);
    }

    #[test]
    fn file_storage_survives_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        FileStorage::new(&path).set("token", "t1").unwrap();
        let reopened = FileStorage::new(&path);

        assert_eq!(reopened.get("token").unwrap(), Some(String::from("t1")));
    }

    #[test]
    fn removing_a_key_leaves_the_others() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("session.json"));
        storage.set("token", "t1").unwrap();
        storage.set("user", "{}").unwrap();

        storage.remove("token").unwrap();

        assert_eq!(storage.get("token").unwrap(), None);
        assert_eq!(storage.get("user").unwrap(), Some(String::from("{}")));
    }

    #[test]
    fn garbage_on_disk_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "definitely not json").unwrap();

        let got = FileStorage::new(&path).get("token");

        assert!(matches!(got, Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn writing_over_garbage_starts_a_fresh_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{"token": 1"#).unwrap();
        let storage = FileStorage::new(&path);

        storage.set("token", "t1").unwrap();

        assert_eq!(storage.get("token").unwrap(), Some(String::from("t1")));
        assert!(!dir.path().join("session.json.tmp").exists());
    }
}
