use super::{read_json, write_json};
use crate::core::cache::KeyValueCollection;
use crate::core::error::StoreError;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stores all keys in one JSON object file.
///
/// Every `put` re-reads the file, inserts, and rewrites it whole. Last write
/// wins if two processes race.
pub struct MapFileCollection<V> {
    path: PathBuf,
    _marker: PhantomData<fn() -> V>,
}

impl<V> MapFileCollection<V> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<V: DeserializeOwned> MapFileCollection<V> {
    async fn load(&self) -> Result<BTreeMap<String, V>, StoreError> {
        Ok(read_json(&self.path).await?.unwrap_or_default())
    }
}

#[async_trait]
impl<V> KeyValueCollection<V> for MapFileCollection<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>, StoreError> {
        let entries = self.load().await?;
        let value = entries.get(key).cloned();
        if value.is_some() {
            debug!("Cache HIT for key: {}", key);
        } else {
            debug!("Cache MISS for key: {}", key);
        }
        Ok(value)
    }

    async fn put(&self, key: &str, value: &V) -> Result<(), StoreError> {
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value.clone());
        write_json(&self.path, &entries).await?;
        debug!("Cache PUT for key: {} ({} entries)", key, entries.len());
        Ok(())
    }
}
