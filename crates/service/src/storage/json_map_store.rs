use std::{collections::HashMap, hash::Hash, path::PathBuf, sync::Arc};
use tokio::{fs, sync::RwLock};
use tracing::debug;

use crate::errors::ServiceError;

/// Generic JSON file-backed key-value map store.
///
/// Keeps a `HashMap<K, V>` in memory and rewrites the whole JSON file after
/// every mutation. Writes happen while the write lock is held and go through a
/// temp file + rename, so concurrent mutations never interleave on disk and a
/// crash mid-write leaves the previous document intact.
#[derive(Clone)]
pub struct JsonMapStore<K, V> {
    inner: Arc<RwLock<HashMap<K, V>>>,
    file_path: PathBuf,
}

fn storage_err(e: impl std::fmt::Display) -> ServiceError {
    ServiceError::Storage(e.to_string())
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Initialize the store from a path. Creates the file with an empty map if missing.
    /// A file that exists but does not parse is an error rather than an empty map.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(storage_err)?;
            }
        }

        let map: HashMap<K, V> = match fs::read(&file_path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| ServiceError::Storage(format!("{}: {e}", file_path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty: HashMap<K, V> = HashMap::new();
                write_atomic(&file_path, &empty).await?;
                empty
            }
            Err(e) => return Err(storage_err(e)),
        };

        debug!(path = %file_path.display(), entries = map.len(), "json map store loaded");
        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(map)), file_path }))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.file_path
    }

    /// List all entries as `(key, value)` pairs.
    pub async fn list(&self) -> Vec<(K, V)> {
        let map = self.inner.read().await;
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Get value by key.
    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    /// Insert or update a value by key and persist.
    pub async fn insert(&self, key: K, value: V) -> Result<(), ServiceError> {
        self.update_map(|m| {
            m.insert(key, value);
            Ok(())
        })
        .await
    }

    /// Remove a key and persist; returns whether it existed.
    pub async fn remove(&self, key: &K) -> Result<bool, ServiceError> {
        self.update_map(|m| Ok(m.remove(key).is_some())).await
    }

    /// Mutate a single entry in place and persist. Returns `None` without
    /// touching the file when the key is absent.
    pub async fn update<F, T>(&self, key: &K, f: F) -> Result<Option<T>, ServiceError>
    where
        F: FnOnce(&mut V) -> T,
    {
        self.try_update(key, |v| Ok(f(v))).await
    }

    /// Like [`update`](Self::update) with a fallible closure. The previous value
    /// is restored when the closure fails or the file cannot be written.
    pub async fn try_update<F, T>(&self, key: &K, f: F) -> Result<Option<T>, ServiceError>
    where
        F: FnOnce(&mut V) -> Result<T, ServiceError>,
    {
        let mut map = self.inner.write().await;
        let Some(value) = map.get_mut(key) else {
            return Ok(None);
        };
        let previous = value.clone();
        let out = match f(value) {
            Ok(out) => out,
            Err(e) => {
                *value = previous;
                return Err(e);
            }
        };
        if let Err(e) = write_atomic(&self.file_path, &*map).await {
            map.insert(key.clone(), previous);
            return Err(e);
        }
        Ok(Some(out))
    }

    /// Apply a mutation to the underlying map and persist under the same lock.
    /// The map is rolled back when the closure fails or the write fails.
    pub async fn update_map<F, T>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut HashMap<K, V>) -> Result<T, ServiceError>,
    {
        let mut map = self.inner.write().await;
        let snapshot = map.clone();
        let res = match f(&mut map) {
            Ok(out) => write_atomic(&self.file_path, &*map).await.map(|()| out),
            Err(e) => Err(e),
        };
        if res.is_err() {
            *map = snapshot;
        }
        res
    }
}

async fn write_atomic<T: serde::Serialize + ?Sized>(path: &std::path::Path, value: &T) -> Result<(), ServiceError> {
    let data = serde_json::to_vec_pretty(value).map_err(storage_err)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, data).await.map_err(storage_err)?;
    fs::rename(&tmp, path).await.map_err(storage_err)?;
    Ok(())
}
