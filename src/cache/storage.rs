//! Key-value persistence backends for the offline cache
//!
//! The cache store never touches a global; it is handed a `KeyValueStorage`
//! holding one serialized blob per storage key.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;

/// String key-value persistence, in the shape of browser local storage
pub trait KeyValueStorage {
    /// Reads the value stored under `key`, or `None` if nothing is stored
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> io::Result<()>;

    /// Removes `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// In-memory storage, for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates an empty in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory storage lock poisoned"))
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// File-backed storage writing one `<key>.json` file per key
///
/// Processes sharing a directory get last-writer-wins semantics; there is no
/// locking across a read-modify-write.
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Directory where storage files are kept
    dir: PathBuf,
}

impl FileStorage {
    /// Creates a FileStorage using the XDG-compliant data directory
    ///
    /// Uses `~/.local/share/vitalvision/` on Linux, or the platform equivalent.
    /// Returns `None` if the directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "vitalvision")?;
        Some(Self::with_dir(project_dirs.data_dir().to_path_buf()))
    }

    /// Creates a FileStorage rooted at a custom directory
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Directory this storage writes into
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_storage() -> (FileStorage, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let storage = FileStorage::with_dir(temp_dir.path().to_path_buf());
        (storage, temp_dir)
    }

    #[test]
    fn test_memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();

        assert_eq!(storage.get("key").unwrap(), None);

        storage.set("key", "value").unwrap();
        assert_eq!(storage.get("key").unwrap().as_deref(), Some("value"));

        storage.set("key", "replaced").unwrap();
        assert_eq!(storage.get("key").unwrap().as_deref(), Some("replaced"));

        storage.remove("key").unwrap();
        assert_eq!(storage.get("key").unwrap(), None);
    }

    #[test]
    fn test_memory_storage_remove_missing_key_succeeds() {
        let storage = MemoryStorage::new();
        assert!(storage.remove("never-set").is_ok());
    }

    #[test]
    fn test_file_storage_read_missing_key_is_none() {
        let (storage, _temp_dir) = create_test_storage();
        assert_eq!(storage.get("missing").unwrap(), None);
    }

    #[test]
    fn test_file_storage_writes_json_file() {
        let (storage, temp_dir) = create_test_storage();

        storage.set("blob", "{\"a\":1}").unwrap();

        let expected_path = temp_dir.path().join("blob.json");
        assert!(expected_path.exists(), "Storage file should exist");
        assert_eq!(storage.get("blob").unwrap().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_file_storage_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested_path = temp_dir.path().join("nested").join("data");
        let storage = FileStorage::with_dir(nested_path.clone());

        storage.set("key", "value").unwrap();

        assert!(nested_path.join("key.json").exists());
    }

    #[test]
    fn test_file_storage_remove() {
        let (storage, temp_dir) = create_test_storage();

        storage.set("key", "value").unwrap();
        storage.remove("key").unwrap();

        assert!(!temp_dir.path().join("key.json").exists());
        assert!(storage.remove("key").is_ok(), "Second remove should succeed");
    }

    #[test]
    fn test_new_creates_xdg_compliant_path() {
        if let Some(storage) = FileStorage::new() {
            let path_str = storage.dir().to_string_lossy();
            assert!(path_str.contains("vitalvision"));
        }
        // Passes if new() returns None (e.g., no home directory in CI)
    }
}
