//! JSON file backed key/value store shared by every command

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::application::errors::StorageError;

/// Environment variable overriding the store location
pub const CONFIG_ENV: &str = "FINCH_CONFIG";

/// Store location when `FINCH_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Process-wide JSON document holding command state.
///
/// Every `set` rewrites the whole file while holding the lock, so concurrent
/// writers never lose each other's keys or interleave partial files.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl ConfigStore {
    /// Load the document at `path`. A missing or unreadable file yields an
    /// empty store; the next `set` creates it.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let values = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Map<String, Value>>(&bytes) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Config is not a JSON object, starting empty: {}", e);
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No saved config, starting empty");
                Map::new()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "Failed to read config, starting empty: {}", e);
                Map::new()
            }
        };

        Self {
            path,
            values: Mutex::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.values.lock().await.get(key).cloned()
    }

    /// Typed read. A value that does not decode as `T` reads as absent.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key).await?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!(key, "Stored value has unexpected shape, ignoring: {}", e);
                None
            }
        }
    }

    /// Store `value` under `key` and rewrite the file. On a write error the
    /// in-memory value is kept and goes out with the next successful write.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let value = serde_json::to_value(value)?;
        let mut values = self.values.lock().await;
        values.insert(key.to_string(), value);
        self.persist(&values).await
    }

    /// Locked read-modify-write of a typed value. The current value, or
    /// `T::default()` when absent or malformed, is handed to `f` and the
    /// result is written back before the lock is released.
    pub async fn update<T, F, R>(&self, key: &str, f: F) -> Result<R, StorageError>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> R,
    {
        let mut values = self.values.lock().await;

        let mut current = values
            .get(key)
            .cloned()
            .and_then(|v| serde_json::from_value::<T>(v).ok())
            .unwrap_or_default();
        let out = f(&mut current);

        values.insert(key.to_string(), serde_json::to_value(&current)?);
        self.persist(&values).await?;
        Ok(out)
    }

    /// Copy of the whole document
    pub async fn snapshot(&self) -> Map<String, Value> {
        self.values.lock().await.clone()
    }

    async fn persist(&self, values: &Map<String, Value>) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(values)?;

        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let written = async {
            let mut file = options.open(&tmp).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp, &self.path).await
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %tmp.display(), "Failed to remove temp file: {}", cleanup);
                }
            }
            return Err(e.into());
        }

        tracing::trace!(path = %self.path.display(), bytes = bytes.len(), "Config saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::load(dir.path().join("config.json")).await;
        assert!(store.snapshot().await.is_empty());
        assert_eq!(store.get("anything").await, None);
    }

    #[tokio::test]
    async fn test_garbage_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, b"[1, 2, 3]").unwrap();

        let store = ConfigStore::load(&path).await;
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_get_as_fails_closed() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::load(dir.path().join("config.json")).await;
        store.set("stats", "not a map").await.unwrap();

        let stats: Option<BTreeMap<String, u64>> = store.get_as("stats").await;
        assert!(stats.is_none());
    }

    #[tokio::test]
    async fn test_update_starts_from_default() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::load(dir.path().join("config.json")).await;

        let n = store
            .update::<u64, _, _>("runs", |n| {
                *n += 1;
                *n
            })
            .await
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(store.get_as::<u64>("runs").await, Some(1));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let store = ConfigStore::load(&path).await;
        store.set("token", "secret").await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_memory_value() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::load(dir.path().join("missing-dir").join("config.json")).await;

        assert!(store.set("key", &1).await.is_err());
        assert_eq!(store.get_as::<i32>("key").await, Some(1));
    }

    #[tokio::test]
    async fn test_failed_save_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        // A directory in the way makes the final rename fail.
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let store = ConfigStore::load(&path).await;
        assert!(store.set("key", &1).await.is_err());
        assert!(!dir.path().join("config.json.tmp").exists());
    }
}
