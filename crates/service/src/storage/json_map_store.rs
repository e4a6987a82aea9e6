use std::{collections::HashMap, hash::Hash, path::{Path, PathBuf}, sync::Arc};
use tokio::{fs, sync::RwLock};

use crate::errors::ServiceError;

/// Generic JSON file-backed key-value map store.
///
/// Persists a `HashMap<K, V>` to a JSON file. Every mutation rewrites the
/// whole file while holding the write lock.
pub struct JsonMapStore<K, V> {
    inner: RwLock<HashMap<K, V>>,
    file_path: PathBuf,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Initialize the store from a path. Creates the file with an empty map if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }

        let map: HashMap<K, V> = match fs::read(&file_path).await {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ServiceError::Storage(format!("corrupt store {}: {e}", file_path.display()))
            })?,
            Err(_) => {
                let empty: HashMap<K, V> = HashMap::new();
                write_map(&file_path, &empty).await?;
                empty
            }
        };

        Ok(Arc::new(Self { inner: RwLock::new(map), file_path }))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Get value by key.
    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    /// Insert only when the key is vacant and persist; returns whether it was written.
    /// A failed write leaves the map as it was.
    pub async fn insert_if_absent(&self, key: K, value: V) -> Result<bool, ServiceError> {
        let mut map = self.inner.write().await;
        if map.contains_key(&key) {
            return Ok(false);
        }
        map.insert(key.clone(), value);
        if let Err(e) = write_map(&self.file_path, &*map).await {
            map.remove(&key);
            return Err(e);
        }
        Ok(true)
    }
}

async fn write_map<K, V>(path: &Path, map: &HashMap<K, V>) -> Result<(), ServiceError>
where
    K: Eq + Hash + serde::Serialize,
    V: serde::Serialize,
{
    let data = serde_json::to_vec(map).map_err(|e| ServiceError::Storage(e.to_string()))?;
    fs::write(path, data).await.map_err(|e| ServiceError::Storage(e.to_string()))?;
    Ok(())
}
