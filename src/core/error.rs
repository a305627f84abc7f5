//! Domain error types

use rust_decimal::Decimal;
use thiserror::Error;

/// Failures while folding ledger events into per-commodity totals.
#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    /// Two aggregates of different commodity types were merged. Never happens
    /// when aggregates are keyed by type.
    #[error("Cannot merge {found} into aggregate of {expected}")]
    TypeMismatch { expected: String, found: String },

    #[error("Appraisal {appraisal_id} has a total buy value of zero")]
    ZeroBuyValue { appraisal_id: String },

    #[error("Values of {commodity_type} are too large to aggregate")]
    Overflow { commodity_type: String },

    #[error("Cannot sell {commodity_type}: nothing bought")]
    UnknownCommodity { commodity_type: String },

    #[error("Cannot sell {requested} of {commodity_type}: only {held} held")]
    OversoldCommodity {
        commodity_type: String,
        requested: Decimal,
        held: Decimal,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum FreightError {
    #[error("Volume {volume} does not fit any freight bracket (largest is {largest})")]
    VolumeOutOfRange { volume: u64, largest: u64 },
}

/// Failures of the local JSON files backing caches and the ledger.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("File I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not deserialize {path}: {source}")]
    Deserialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not serialize {path}: {source}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn deserialization(path: &std::path::Path, source: serde_json::Error) -> Self {
        StoreError::Deserialization {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn serialization(path: &std::path::Path, source: serde_json::Error) -> Self {
        StoreError::Serialization {
            path: path.display().to_string(),
            source,
        }
    }
}
