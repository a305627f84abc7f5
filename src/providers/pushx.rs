use crate::core::config::PushXProviderConfig;
use crate::core::freight::{FreightProvider, FreightRoute};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Url;
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Client for the PushX freight quote service.
pub struct PushXProvider {
    base_url: String,
    api_client: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct PushXQuote {
    #[serde(rename = "PriceNormal")]
    price_normal: Decimal,
}

impl PushXProvider {
    pub fn new(config: &PushXProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("eveprofits/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_client: config.api_client.clone(),
            client,
        })
    }

    fn quote_url(&self, route: &FreightRoute, volume: u64, collateral: u64) -> Result<Url> {
        Url::parse_with_params(
            &format!("{}/api/quote/json", self.base_url),
            &[
                ("startSystemName", route.origin.clone()),
                ("endSystemName", route.destination.clone()),
                ("volume", volume.to_string()),
                ("collateral", collateral.to_string()),
                ("apiClient", self.api_client.clone()),
            ],
        )
        .with_context(|| format!("Invalid PushX base url: {}", self.base_url))
    }
}

#[async_trait]
impl FreightProvider for PushXProvider {
    async fn fetch_quote(
        &self,
        route: &FreightRoute,
        volume: u64,
        collateral: u64,
        cancel: &CancellationToken,
    ) -> Result<Decimal> {
        let url = self.quote_url(route, volume, collateral)?;
        debug!("Requesting freight quote from {}", url);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => bail!("Freight quote request cancelled"),
            response = self.client.get(url).send() => response,
        };
        let response_text = response
            .with_context(|| {
                format!(
                    "Failed to send freight quote request for {} -> {}",
                    route.origin, route.destination
                )
            })?
            .text()
            .await
            .context("Failed to get freight quote response text")?;

        let quote: PushXQuote = serde_json::from_str(&response_text).with_context(|| {
            format!("Failed to parse PushX response. Response: '{response_text}'")
        })?;

        debug!(
            "Freight quote {} -> {} for {}m3 / {} ISK: {}",
            route.origin, route.destination, volume, collateral, quote.price_normal
        );
        Ok(quote.price_normal)
    }
}
