//! Freight quote abstractions

use crate::core::error::FreightError;
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Volume tiers (m3) quotes are requested for, ascending.
pub const FREIGHT_BRACKETS: [u64; 5] = [12_500, 62_500, 360_000, 848_000, 1_126_500];

/// A contract route between two solar systems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreightRoute {
    pub origin: String,
    pub destination: String,
}

impl FreightRoute {
    pub fn new(origin: &str, destination: &str) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
        }
    }
}

/// Smallest bracket strictly greater than `volume`.
pub fn bracket_volume(volume: u64) -> Result<u64, FreightError> {
    FREIGHT_BRACKETS
        .iter()
        .copied()
        .find(|bracket| *bracket > volume)
        .ok_or(FreightError::VolumeOutOfRange {
            volume,
            largest: FREIGHT_BRACKETS[FREIGHT_BRACKETS.len() - 1],
        })
}

#[async_trait]
pub trait FreightProvider: Send + Sync {
    async fn fetch_quote(
        &self,
        route: &FreightRoute,
        volume: u64,
        collateral: u64,
        cancel: &CancellationToken,
    ) -> Result<Decimal>;
}
