use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use super::{KeyValueStore, StorageError, StorageResult};

/// Storage file name in the data directory
const STORE_FILE: &str = "session-store.json";

/// Owner read/write only; the file holds the bearer token
#[cfg(unix)]
const STORE_FILE_MODE: u32 = 0o600;

/// Key-value store persisted as a flat JSON object.
///
/// Every mutation rewrites the whole file through a temporary sibling and a
/// rename, so a crash never leaves a half-written store behind. File I/O runs
/// on the blocking thread pool.
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Arc<Mutex<()>>,
}

impl FileStore {
    /// Store rooted in `dir`, using the default file name
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(STORE_FILE))
    }

    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read-modify-write the map on the blocking pool
    async fn modify<F>(&self, f: F) -> StorageResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) + Send + 'static,
    {
        let path = self.path.clone();
        let lock = Arc::clone(&self.write_lock);
        tokio::task::spawn_blocking(move || -> StorageResult<()> {
            let _guard = lock
                .lock()
                .map_err(|_| StorageError::Unavailable("file store lock poisoned".to_string()))?;
            let mut map = read_map(&path)?;
            f(&mut map);
            write_map(&path, &map)
        })
        .await
        .map_err(|e| StorageError::Unavailable(format!("file store task failed: {}", e)))?
    }
}

fn read_map(path: &Path) -> StorageResult<BTreeMap<String, String>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(e.into()),
    };
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    Ok(serde_json::from_str(&contents)?)
}

fn write_map(path: &Path, map: &BTreeMap<String, String>) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    // A stale temp file would keep its old permissions
    match fs::remove_file(&tmp) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let contents = serde_json::to_string_pretty(map)?;
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(STORE_FILE_MODE);
    }
    let mut file = options.open(&tmp)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[async_trait]
impl KeyValueStore for FileStore {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || -> StorageResult<Option<String>> {
            Ok(read_map(&path)?.remove(&key))
        })
            .await
            .map_err(|e| StorageError::Unavailable(format!("file store task failed: {}", e)))?
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        debug!(key, path = %self.path.display(), "Writing store entry");
        let (key, value) = (key.to_string(), value.to_string());
        self.modify(move |map| {
            map.insert(key, value);
        })
        .await
    }

    async fn remove_many(&self, keys: &[&str]) -> StorageResult<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let keys: Vec<String> = keys.iter().map(|key| key.to_string()).collect();
        self.modify(move |map| {
            for key in &keys {
                map.remove(key);
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_values_survive_a_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(dir.path());
        store.set("token", "abc123").await.unwrap();
        store.set("userRole", "STUDENT").await.unwrap();

        let reopened = FileStore::in_dir(dir.path());
        assert_eq!(reopened.get("token").await.unwrap().as_deref(), Some("abc123"));
        assert_eq!(reopened.get("userRole").await.unwrap().as_deref(), Some("STUDENT"));
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(&dir.path().join("nested"));
        assert_eq!(store.get("token").await.unwrap(), None);
        // Removing from a store that was never written is a no-op
        store.remove_many(&["token"]).await.unwrap();
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_remove_many_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(dir.path());
        store.set("token", "abc").await.unwrap();
        store.set("universityId", "7").await.unwrap();
        store.set("theme", "dark").await.unwrap();

        store.remove_many(&["token", "universityId"]).await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), None);
        assert_eq!(store.get("universityId").await.unwrap(), None);
        assert_eq!(store.get("theme").await.unwrap().as_deref(), Some("dark"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_store_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(dir.path());
        // Leftover temp file from an interrupted write, world-readable
        std::fs::write(store.path().with_extension("json.tmp"), "{}").unwrap();
        store.set("token", "secret").await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_works_on_current_thread_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(dir.path());
        store.set("token", "abc").await.unwrap();
        assert_eq!(store.get("token").await.unwrap().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(dir.path());
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.get("token").await, Err(StorageError::Corrupt(_))));
    }
}
