use crate::core::appraisal::{Appraisal, AppraisalLine, AppraisalProvider, OrePrice};
use crate::core::config::JaniceProviderConfig;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

const API_KEY_HEADER: &str = "X-ApiKey";

/// Client for the Janice appraisal service.
pub struct JaniceProvider {
    base_url: String,
    api_key: Option<String>,
    market: u32,
    watched_ores: Vec<String>,
    client: reqwest::Client,
}

impl JaniceProvider {
    pub fn new(config: &JaniceProviderConfig, watched_ores: &[String]) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("eveprofits/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            market: config.market,
            watched_ores: watched_ores.to_vec(),
            client,
        })
    }

    fn with_api_key(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    async fn send_and_parse<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T> {
        let response = self
            .with_api_key(request)
            .send()
            .await
            .with_context(|| format!("Failed to send request for {what}"))?
            .error_for_status()
            .with_context(|| format!("Janice returned an error for {what}"))?;

        let response_text = response
            .text()
            .await
            .with_context(|| format!("Failed to get response text for {what}"))?;

        if response_text.trim().is_empty() {
            return Err(anyhow!("Received empty response for {}", what));
        }

        serde_json::from_str(&response_text).with_context(|| {
            format!("Failed to parse Janice response for {what}. Response: '{response_text}'")
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JaniceSummaryPrices {
    total_buy_price: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JanicePrices {
    buy_price: Decimal,
    sell_price: Decimal,
    buy_price_total: Decimal,
    sell_price_total: Decimal,
}

#[derive(Debug, Deserialize)]
struct JaniceItemType {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JaniceAppraisalItem {
    amount: Decimal,
    total_volume: Decimal,
    effective_prices: JanicePrices,
    item_type: JaniceItemType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JaniceAppraisalResponse {
    effective_prices: JaniceSummaryPrices,
    items: Vec<JaniceAppraisalItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JanicePricerItem {
    immediate_prices: JanicePrices,
    item_type: JaniceItemType,
}

#[async_trait]
impl AppraisalProvider for JaniceProvider {
    async fn fetch_appraisal(&self, appraisal_id: &str) -> Result<Appraisal> {
        let url = format!("{}/api/rest/v2/appraisal/{}", self.base_url, appraisal_id);
        debug!("Requesting appraisal from {}", url);

        let response: JaniceAppraisalResponse = self
            .send_and_parse(self.client.get(&url), &format!("appraisal {appraisal_id}"))
            .await?;

        let lines = response
            .items
            .into_iter()
            .map(|item| AppraisalLine {
                commodity_type: item.item_type.name,
                amount: item.amount,
                volume: item.total_volume,
                buy_total: item.effective_prices.buy_price_total,
                sell_total: item.effective_prices.sell_price_total,
            })
            .collect::<Vec<_>>();

        debug!(
            "Fetched appraisal {} with {} lines, total buy {}",
            appraisal_id,
            lines.len(),
            response.effective_prices.total_buy_price
        );

        Ok(Appraisal {
            total_buy_value: response.effective_prices.total_buy_price,
            lines,
        })
    }

    async fn fetch_ore_prices(&self) -> Result<Vec<OrePrice>> {
        let url = format!("{}/api/rest/v2/pricer?market={}", self.base_url, self.market);
        debug!(
            "Requesting prices for {} ores from {}",
            self.watched_ores.len(),
            url
        );

        let items: Vec<JanicePricerItem> = self
            .send_and_parse(
                self.client.post(&url).body(self.watched_ores.join("\n")),
                "ore prices",
            )
            .await?;

        Ok(items
            .into_iter()
            .map(|item| OrePrice {
                commodity_type: item.item_type.name,
                buy_price: item.immediate_prices.buy_price,
                sell_price: item.immediate_prices.sell_price,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const APPRAISAL_RESPONSE: &str = r#"{
        "id": 1,
        "input": "Compressed Veldspar 100",
        "effectivePrices": {
            "totalBuyPrice": 2000.0,
            "totalSplitPrice": 2250.0,
            "totalSellPrice": 2500.0
        },
        "items": [
            {
                "amount": 100,
                "totalVolume": 10.0,
                "effectivePrices": {
                    "buyPrice": 15.0,
                    "sellPrice": 20.0,
                    "buyPriceTotal": 1500.0,
                    "sellPriceTotal": 2000.0
                },
                "immediatePrices": {
                    "buyPrice": 14.0,
                    "sellPrice": 21.0,
                    "buyPriceTotal": 1400.0,
                    "sellPriceTotal": 2100.0
                },
                "itemType": { "eid": 62516, "name": "Compressed Veldspar", "volume": 0.1 }
            },
            {
                "amount": 5,
                "totalVolume": 0.5,
                "effectivePrices": {
                    "buyPrice": 100.0,
                    "sellPrice": 100.0,
                    "buyPriceTotal": 500.0,
                    "sellPriceTotal": 500.0
                },
                "immediatePrices": {
                    "buyPrice": 100.0,
                    "sellPrice": 100.0,
                    "buyPriceTotal": 500.0,
                    "sellPriceTotal": 500.0
                },
                "itemType": { "eid": 62568, "name": "Compressed Sylvite", "volume": 0.1 }
            }
        ]
    }"#;

    fn config(base_url: &str, api_key: Option<&str>) -> JaniceProviderConfig {
        JaniceProviderConfig {
            base_url: base_url.to_string(),
            api_key: api_key.map(str::to_string),
            market: 2,
        }
    }

    async fn create_appraisal_mock_server(
        appraisal_id: &str,
        mock_response: &str,
        status_code: u16,
    ) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/api/rest/v2/appraisal/{appraisal_id}")))
            .respond_with(ResponseTemplate::new(status_code).set_body_string(mock_response))
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_successful_appraisal_fetch() {
        let mock_server = create_appraisal_mock_server("abc", APPRAISAL_RESPONSE, 200).await;
        let provider = JaniceProvider::new(&config(&mock_server.uri(), None), &[]).unwrap();

        let appraisal = provider.fetch_appraisal("abc").await.unwrap();

        assert_eq!(appraisal.total_buy_value, dec!(2000));
        assert_eq!(
            appraisal.lines,
            vec![
                AppraisalLine {
                    commodity_type: "Compressed Veldspar".to_string(),
                    amount: dec!(100),
                    volume: dec!(10),
                    buy_total: dec!(1500),
                    sell_total: dec!(2000),
                },
                AppraisalLine {
                    commodity_type: "Compressed Sylvite".to_string(),
                    amount: dec!(5),
                    volume: dec!(0.5),
                    buy_total: dec!(500),
                    sell_total: dec!(500),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_api_key_header_is_sent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rest/v2/appraisal/abc"))
            .and(header("X-ApiKey", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(APPRAISAL_RESPONSE))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider =
            JaniceProvider::new(&config(&mock_server.uri(), Some("secret")), &[]).unwrap();
        assert!(provider.fetch_appraisal("abc").await.is_ok());
    }

    #[tokio::test]
    async fn test_malformed_appraisal_response() {
        let mock_server =
            create_appraisal_mock_server("abc", r#"{ "not_items": [] }"#, 200).await;
        let provider = JaniceProvider::new(&config(&mock_server.uri(), None), &[]).unwrap();

        let error_message = provider.fetch_appraisal("abc").await.unwrap_err().to_string();
        assert!(error_message.starts_with("Failed to parse Janice response for appraisal abc"));
        assert!(error_message.contains("Response: '{ \"not_items\": [] }'"));
    }

    #[tokio::test]
    async fn test_appraisal_server_error() {
        let mock_server = create_appraisal_mock_server("abc", "Server Error", 500).await;
        let provider = JaniceProvider::new(&config(&mock_server.uri(), None), &[]).unwrap();

        let error_message = provider.fetch_appraisal("abc").await.unwrap_err().to_string();
        assert_eq!(error_message, "Janice returned an error for appraisal abc");
    }

    #[tokio::test]
    async fn test_empty_appraisal_response() {
        let mock_server = create_appraisal_mock_server("abc", "", 200).await;
        let provider = JaniceProvider::new(&config(&mock_server.uri(), None), &[]).unwrap();

        assert_eq!(
            provider.fetch_appraisal("abc").await.unwrap_err().to_string(),
            "Received empty response for appraisal abc"
        );
    }

    #[tokio::test]
    async fn test_ore_prices_fetch() {
        let mock_server = MockServer::start().await;
        let mock_response = r#"[
            {
                "amount": 1,
                "effectivePrices": { "buyPrice": 1, "sellPrice": 1, "buyPriceTotal": 1, "sellPriceTotal": 1 },
                "immediatePrices": { "buyPrice": 90.5, "sellPrice": 110.5, "buyPriceTotal": 90.5, "sellPriceTotal": 110.5 },
                "itemType": { "eid": 62516, "name": "Compressed Veldspar", "volume": 0.1 }
            }
        ]"#;

        Mock::given(method("POST"))
            .and(path("/api/rest/v2/pricer"))
            .and(query_param("market", "2"))
            .and(body_string("Compressed Veldspar\nCompressed Sylvite"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .expect(1)
            .mount(&mock_server)
            .await;

        let ores = vec![
            "Compressed Veldspar".to_string(),
            "Compressed Sylvite".to_string(),
        ];
        let provider = JaniceProvider::new(&config(&mock_server.uri(), None), &ores).unwrap();

        let prices = provider.fetch_ore_prices().await.unwrap();
        assert_eq!(
            prices,
            vec![OrePrice {
                commodity_type: "Compressed Veldspar".to_string(),
                buy_price: dec!(90.5),
                sell_price: dec!(110.5),
            }]
        );
    }
}
