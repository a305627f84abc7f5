use crate::core::appraisal::{Appraisal, AppraisalProvider, OrePrice};
use crate::core::cache::KeyValueCollection;
use crate::core::freight::{FreightProvider, FreightRoute, bracket_volume};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Cache key for the ore price snapshot taken during the hour of `now`.
pub fn hour_bucket(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d%H").to_string()
}

// Caching for AppraisalProvider
pub struct CachingAppraisalProvider<T: AppraisalProvider> {
    inner: T,
    appraisals: Arc<dyn KeyValueCollection<Appraisal>>,
    ore_prices: Arc<dyn KeyValueCollection<Vec<OrePrice>>>,
}

impl<T: AppraisalProvider> CachingAppraisalProvider<T> {
    pub fn new(
        inner: T,
        appraisals: Arc<dyn KeyValueCollection<Appraisal>>,
        ore_prices: Arc<dyn KeyValueCollection<Vec<OrePrice>>>,
    ) -> Self {
        Self {
            inner,
            appraisals,
            ore_prices,
        }
    }
}

#[async_trait]
impl<T: AppraisalProvider> AppraisalProvider for CachingAppraisalProvider<T> {
    async fn fetch_appraisal(&self, appraisal_id: &str) -> Result<Appraisal> {
        if let Some(cached) = self.appraisals.get(appraisal_id).await? {
            debug!("Cache hit for appraisal: {}", appraisal_id);
            return Ok(cached);
        }

        debug!("Cache miss for appraisal: {}", appraisal_id);
        let appraisal = self.inner.fetch_appraisal(appraisal_id).await?;
        self.appraisals.put(appraisal_id, &appraisal).await?;
        Ok(appraisal)
    }

    /// Prices are cached per UTC hour, so a new snapshot is fetched once the
    /// hour rolls over.
    async fn fetch_ore_prices(&self) -> Result<Vec<OrePrice>> {
        let key = hour_bucket(Utc::now());
        if let Some(cached) = self.ore_prices.get(&key).await? {
            debug!("Cache hit for ore prices: {}", key);
            return Ok(cached);
        }

        debug!("Cache miss for ore prices: {}", key);
        let prices = self.inner.fetch_ore_prices().await?;
        self.ore_prices.put(&key, &prices).await?;
        Ok(prices)
    }
}

// Caching for FreightProvider
pub struct CachingFreightProvider<T: FreightProvider> {
    inner: T,
    quotes: Arc<dyn KeyValueCollection<Decimal>>,
}

impl<T: FreightProvider> CachingFreightProvider<T> {
    pub fn new(inner: T, quotes: Arc<dyn KeyValueCollection<Decimal>>) -> Self {
        Self { inner, quotes }
    }
}

#[async_trait]
impl<T: FreightProvider> FreightProvider for CachingFreightProvider<T> {
    /// Normalizes `volume` to its freight bracket before the cache lookup and
    /// the remote request.
    async fn fetch_quote(
        &self,
        route: &FreightRoute,
        volume: u64,
        collateral: u64,
        cancel: &CancellationToken,
    ) -> Result<Decimal> {
        let bracket = bracket_volume(volume)?;
        let key = format!(
            "{}_{}_{}_{}",
            route.origin, route.destination, bracket, collateral
        );

        if let Some(cached) = self.quotes.get(&key).await? {
            debug!("Cache hit for freight quote: {}", key);
            return Ok(cached);
        }

        debug!("Cache miss for freight quote: {}", key);
        let quote = self
            .inner
            .fetch_quote(route, bracket, collateral, cancel)
            .await?;
        self.quotes.put(&key, &quote).await?;
        Ok(quote)
    }
}
