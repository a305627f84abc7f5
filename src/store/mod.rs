pub mod disk;
pub mod ledger;
pub mod map_file;
pub mod memory;

use crate::core::appraisal::{Appraisal, OrePrice};
use crate::core::error::StoreError;
use disk::DirectoryCollection;
use ledger::LedgerStore;
use map_file::MapFileCollection;
use rust_decimal::Decimal;
use serde::{Serialize, de::DeserializeOwned};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Local files of the application, all below one data directory.
#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    /// One file per appraisal id.
    pub fn appraisals(&self) -> DirectoryCollection<Appraisal> {
        DirectoryCollection::new(self.cache_dir(), "janice")
    }

    /// One file per hour bucket.
    pub fn ore_prices(&self) -> DirectoryCollection<Vec<OrePrice>> {
        DirectoryCollection::new(self.cache_dir(), "janice_all")
    }

    /// All freight quotes in a single file.
    pub fn freight_quotes(&self) -> MapFileCollection<Decimal> {
        MapFileCollection::new(self.cache_dir().join("pushx_cache.json"))
    }

    pub fn ledger(&self) -> LedgerStore {
        LedgerStore::new(self.root.join("ledger.json"))
    }
}

/// Reads and decodes a JSON file. A missing file is `Ok(None)`.
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };

    serde_json::from_slice(&content)
        .map(Some)
        .map_err(|e| StoreError::deserialization(path, e))
}

/// Encodes `value` as JSON and replaces the file, creating parent directories.
pub(crate) async fn write_json<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }

    let content =
        serde_json::to_vec_pretty(value).map_err(|e| StoreError::serialization(path, e))?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| StoreError::io(path, e))
}
