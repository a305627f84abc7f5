use crate::core::error::StoreError;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

/// A namespace of cached values addressed by string keys.
///
/// A missing entry is `Ok(None)`. An entry that exists but cannot be decoded
/// is an error, never a miss.
#[async_trait]
pub trait KeyValueCollection<V>: Send + Sync
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>, StoreError>;

    async fn put(&self, key: &str, value: &V) -> Result<(), StoreError>;
}
