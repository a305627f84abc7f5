//! Provides functions for deriving buy/sell/break-even economics from aggregates.
use crate::core::aggregate::{AggregatedCommodity, Aggregation};
use anyhow::{Result, bail};
use rust_decimal::Decimal;

/// Parameters shared by every row of a profit report.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfitParams {
    /// Broker fee and sales tax charged on sell orders, in percent.
    pub fee_rate_percent: Decimal,
    /// Freight cost per ISK of cargo value.
    pub freight_rate: Decimal,
}

impl ProfitParams {
    /// Derives the freight rate from a quote for a reference contract: hauling
    /// `collateral` worth of cargo costs `freight_quote`.
    pub fn new(fee_rate_percent: Decimal, freight_quote: Decimal, collateral: u64) -> Result<Self> {
        if fee_rate_percent < Decimal::ZERO || fee_rate_percent >= Decimal::ONE_HUNDRED {
            bail!("Fee rate must be in [0, 100), got {fee_rate_percent}");
        }
        if collateral == 0 {
            bail!("Freight collateral must be positive");
        }

        Ok(Self {
            fee_rate_percent,
            freight_rate: freight_quote / Decimal::from(collateral),
        })
    }
}

/// Profitability of a single aggregated commodity.
#[derive(Debug, Clone)]
pub struct CommodityProfit {
    pub commodity: AggregatedCommodity,
    pub bought_for_percentage: Option<Decimal>,
    pub freight_cost: Decimal,
    pub break_even_sell_price: Decimal,
    pub break_even_per_unit: Option<Decimal>,
}

impl CommodityProfit {
    pub fn is_profitable(&self) -> bool {
        self.commodity.total_sell_value > self.break_even_sell_price
    }
}

#[derive(Debug, Clone)]
pub struct ProfitReport {
    pub rows: Vec<CommodityProfit>,
    pub total_buy_value: Decimal,
    pub total_paid: Decimal,
    pub total_sell_value: Decimal,
}

/// Computes the minimum sale proceeds that recover the purchase price, the
/// sell fees and the freight for one commodity.
pub fn break_even_sell_price(commodity: &AggregatedCommodity, params: &ProfitParams) -> Decimal {
    let kept_after_fees = Decimal::ONE - params.fee_rate_percent / Decimal::ONE_HUNDRED;
    commodity.amount_paid_for / kept_after_fees + commodity.total_sell_value * params.freight_rate
}

/// Builds the report rows in ascending commodity type order.
pub fn calculate_profits(aggregation: &Aggregation, params: &ProfitParams) -> ProfitReport {
    let rows: Vec<CommodityProfit> = aggregation
        .values()
        .map(|commodity| {
            let break_even = break_even_sell_price(commodity, params);
            CommodityProfit {
                commodity: commodity.clone(),
                bought_for_percentage: commodity.bought_for_percentage(),
                freight_cost: commodity.total_sell_value * params.freight_rate,
                break_even_sell_price: break_even,
                break_even_per_unit: (!commodity.amount.is_zero())
                    .then(|| break_even / commodity.amount),
            }
        })
        .collect();

    ProfitReport {
        total_buy_value: rows.iter().map(|r| r.commodity.total_buy_value).sum(),
        total_paid: rows.iter().map(|r| r.commodity.amount_paid_for).sum(),
        total_sell_value: rows.iter().map(|r| r.commodity.total_sell_value).sum(),
        rows,
    }
}
