//! Ledger event types

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A purchased lot, valued through an external appraisal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuybackEvent {
    pub price_paid: Decimal,
    pub appraisal_id: String,
    pub happened_at: DateTime<Utc>,
}

impl BuybackEvent {
    pub fn new(price_paid: Decimal, appraisal_id: &str) -> Self {
        Self {
            price_paid,
            appraisal_id: appraisal_id.to_string(),
            happened_at: Utc::now(),
        }
    }
}

/// Part of the held stock of one commodity sold off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleEvent {
    pub commodity_type: String,
    pub amount: Decimal,
    pub proceeds: Decimal,
    pub happened_at: DateTime<Utc>,
}

impl SaleEvent {
    pub fn new(commodity_type: &str, amount: Decimal, proceeds: Decimal) -> Self {
        Self {
            commodity_type: commodity_type.to_string(),
            amount,
            proceeds,
            happened_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEvent {
    Buyback(BuybackEvent),
    Sale(SaleEvent),
}

/// Largest price a single buyback may record: one quadrillion ISK.
pub const MAX_BUYBACK_PRICE: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Rejects negative prices and prices above [`MAX_BUYBACK_PRICE`].
pub fn validate_buyback_price(price: Decimal) -> Result<Decimal> {
    if price.is_sign_negative() && !price.is_zero() {
        bail!("Buyback price cannot be negative: {price}");
    }
    if price > MAX_BUYBACK_PRICE {
        bail!("Buyback price {price} exceeds the maximum of {MAX_BUYBACK_PRICE}");
    }
    Ok(price)
}

/// Parses a console line of the form `<price> <appraisal-id>`.
///
/// Lines with any other number of tokens yield `Ok(None)` and are meant to be
/// skipped. A line with two tokens whose price is not a number, or is out of
/// range, is an error.
pub fn parse_buyback_line(line: &str) -> Result<Option<BuybackEvent>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let [price, appraisal_id] = tokens.as_slice() else {
        return Ok(None);
    };

    let price_paid =
        Decimal::from_str(price).with_context(|| format!("Invalid buyback price: '{price}'"))?;
    let price_paid = validate_buyback_price(price_paid)?;
    Ok(Some(BuybackEvent::new(price_paid, appraisal_id)))
}
