//! Core business logic abstractions

pub mod aggregate;
pub mod analytics;
pub mod appraisal;
pub mod cache;
pub mod config;
pub mod error;
pub mod freight;
pub mod ledger;
pub mod log;

// Re-export main types for cleaner imports
pub use aggregate::{AggregatedCommodity, Aggregation};
pub use appraisal::{Appraisal, AppraisalLine, AppraisalProvider, OrePrice};
pub use freight::{FreightProvider, FreightRoute};
pub use ledger::{BuybackEvent, LedgerEvent, SaleEvent};
