//! Appraisal abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One commodity type inside an appraised lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppraisalLine {
    pub commodity_type: String,
    pub amount: Decimal,
    pub volume: Decimal,
    pub buy_total: Decimal,
    pub sell_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appraisal {
    pub total_buy_value: Decimal,
    pub lines: Vec<AppraisalLine>,
}

/// Current market price of a single unit of ore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrePrice {
    pub commodity_type: String,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
}

impl OrePrice {
    pub fn split_price(&self) -> Decimal {
        (self.buy_price + self.sell_price) / Decimal::TWO
    }
}

#[async_trait]
pub trait AppraisalProvider: Send + Sync {
    async fn fetch_appraisal(&self, appraisal_id: &str) -> Result<Appraisal>;

    /// Prices for the configured list of watched ores.
    async fn fetch_ore_prices(&self) -> Result<Vec<OrePrice>>;
}
