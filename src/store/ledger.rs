use super::{read_json, write_json};
use crate::core::error::StoreError;
use crate::core::ledger::LedgerEvent;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Append-only event log kept as a JSON array.
///
/// Appends read the whole file and rewrite it. Not transactional; a crash
/// mid-write can lose the file.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All events in the order they were recorded. A missing file is an empty ledger.
    pub async fn events(&self) -> Result<Vec<LedgerEvent>, StoreError> {
        let events: Vec<LedgerEvent> = read_json(&self.path).await?.unwrap_or_default();
        debug!("Read {} ledger events from {}", events.len(), self.path.display());
        Ok(events)
    }

    pub async fn append(&self, event: LedgerEvent) -> Result<(), StoreError> {
        let mut events = self.events().await?;
        info!(?event, "Recording ledger event");
        events.push(event);
        write_json(&self.path, &events).await
    }
}
