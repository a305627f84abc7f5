use super::{read_json, write_json};
use crate::core::cache::KeyValueCollection;
use crate::core::error::StoreError;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use std::path::PathBuf;
use tracing::debug;

/// Stores every key in its own JSON file, `<dir>/<prefix>_<key>.json`.
pub struct DirectoryCollection<V> {
    dir: PathBuf,
    prefix: String,
    _marker: PhantomData<fn() -> V>,
}

impl<V> DirectoryCollection<V> {
    pub fn new(dir: impl Into<PathBuf>, prefix: &str) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.to_string(),
            _marker: PhantomData,
        }
    }

    /// File backing `key`. The key is percent-encoded, so distinct keys get
    /// distinct files and no key can leave the cache directory.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{}.json", self.prefix, urlencoding::encode(key)))
    }
}

#[async_trait]
impl<V> KeyValueCollection<V> for DirectoryCollection<V>
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>, StoreError> {
        let path = self.path_for(key);
        let value = read_json(&path).await?;
        if value.is_some() {
            debug!("Cache HIT for key: {} ({})", key, path.display());
        } else {
            debug!("Cache MISS for key: {}", key);
        }
        Ok(value)
    }

    async fn put(&self, key: &str, value: &V) -> Result<(), StoreError> {
        let path = self.path_for(key);
        write_json(&path, value).await?;
        debug!("Cache PUT for key: {} ({})", key, path.display());
        Ok(())
    }
}
