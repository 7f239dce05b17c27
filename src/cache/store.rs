use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

/// String key-value storage behind the response cache.
///
/// Storage is best-effort: a failed read degrades to a miss and a
/// failed write is dropped. Neither surfaces an error to callers.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: &str);
    async fn remove(&self, key: &str);
    /// All stored keys starting with `prefix`.
    async fn keys(&self, prefix: &str) -> Vec<String>;
}

/// In-process store, used when no cache directory is configured.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().ok()?.get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    async fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }

    async fn keys(&self, prefix: &str) -> Vec<String> {
        match self.entries.read() {
            Ok(entries) => entries
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// One JSON file per key under a cache directory. Keys can contain
/// characters that are not filesystem-safe, so the filename is the
/// sha256 of the key and the original key is recorded inside the file.
pub struct DiskStore {
    dir: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct DiskRecord {
    key: String,
    value: String,
}

impl DiskStore {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(hasher.finalize())))
    }

    async fn read_record(path: &PathBuf) -> Option<DiskRecord> {
        let raw = tokio::fs::read_to_string(path).await.ok()?;
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding unreadable cache file");
                None
            }
        }
    }
}

#[async_trait]
impl KvStore for DiskStore {
    async fn get(&self, key: &str) -> Option<String> {
        let record = Self::read_record(&self.path_for(key)).await?;
        (record.key == key).then_some(record.value)
    }

    async fn set(&self, key: &str, value: &str) {
        let record = DiskRecord {
            key: key.to_string(),
            value: value.to_string(),
        };
        let raw = match serde_json::to_string(&record) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize cache record");
                return;
            }
        };
        if let Err(e) = tokio::fs::write(self.path_for(key), raw).await {
            warn!(key, error = %e, "failed to write cache file");
        }
    }

    async fn remove(&self, key: &str) {
        let path = self.path_for(key);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(key, error = %e, "failed to remove cache file");
            }
        }
    }

    async fn keys(&self, prefix: &str) -> Vec<String> {
        let mut keys = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "failed to list cache directory");
                return keys;
            }
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            if let Some(record) = Self::read_record(&entry.path()).await {
                if record.key.starts_with(prefix) {
                    keys.push(record.key);
                }
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();

        assert_eq!(store.get("missing").await, None);

        store.set("k1", "v1").await;
        assert_eq!(store.get("k1").await, Some("v1".to_string()));

        store.set("k1", "v2").await;
        assert_eq!(store.get("k1").await, Some("v2".to_string()));

        store.remove("k1").await;
        assert_eq!(store.get("k1").await, None);
    }

    #[tokio::test]
    async fn test_memory_store_keys_by_prefix() {
        let store = MemoryStore::new();
        store.set("cache_a_1", "x").await;
        store.set("cache_a_2", "y").await;
        store.set("cache_b_1", "z").await;

        let mut keys = store.keys("cache_a_").await;
        keys.sort();
        assert_eq!(keys, vec!["cache_a_1", "cache_a_2"]);

        assert_eq!(store.keys("cache_").await.len(), 3);
        assert!(store.keys("other_").await.is_empty());
    }

    #[tokio::test]
    async fn test_disk_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path()).unwrap();

        assert_eq!(store.get("missing").await, None);

        store.set("k1", r#"{"some":"json"}"#).await;
        assert_eq!(store.get("k1").await, Some(r#"{"some":"json"}"#.to_string()));

        store.remove("k1").await;
        assert_eq!(store.get("k1").await, None);

        // Removing again is a no-op.
        store.remove("k1").await;
    }

    #[tokio::test]
    async fn test_disk_store_keys_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path()).unwrap();

        store.set("cache_details_1", "a").await;
        store.set("cache_search_1", "b").await;

        let keys = store.keys("cache_details_").await;
        assert_eq!(keys, vec!["cache_details_1"]);
    }

    #[tokio::test]
    async fn test_disk_store_ignores_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path()).unwrap();

        store.set("good", "value").await;
        std::fs::write(dir.path().join("corrupt.json"), "not json").unwrap();

        assert_eq!(store.keys("").await, vec!["good"]);
    }
}
