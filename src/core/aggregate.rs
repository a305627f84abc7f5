//! Folds ledger events into running per-commodity totals.
use crate::core::appraisal::{Appraisal, AppraisalLine, AppraisalProvider};
use crate::core::error::AggregateError;
use crate::core::ledger::{LedgerEvent, SaleEvent};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Running totals for a single commodity type across all buybacks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedCommodity {
    pub commodity_type: String,
    pub amount: Decimal,
    pub total_buy_value: Decimal,
    pub total_sell_value: Decimal,
    pub amount_paid_for: Decimal,
}

/// Aggregates keyed by commodity type, iterated in ascending type order.
pub type Aggregation = BTreeMap<String, AggregatedCommodity>;

impl AggregatedCommodity {
    pub fn from_line(line: &AppraisalLine, line_paid: Decimal) -> Self {
        Self {
            commodity_type: line.commodity_type.clone(),
            amount: line.volume,
            total_buy_value: line.buy_total,
            total_sell_value: line.sell_total,
            amount_paid_for: line_paid,
        }
    }

    /// Adds `other` into `self` field by field. Both must be the same type.
    pub fn merge(&mut self, other: &AggregatedCommodity) -> Result<(), AggregateError> {
        if other.commodity_type != self.commodity_type {
            return Err(AggregateError::TypeMismatch {
                expected: self.commodity_type.clone(),
                found: other.commodity_type.clone(),
            });
        }

        let overflow = || AggregateError::Overflow {
            commodity_type: self.commodity_type.clone(),
        };
        let amount = self.amount.checked_add(other.amount).ok_or_else(overflow)?;
        let total_buy_value = self
            .total_buy_value
            .checked_add(other.total_buy_value)
            .ok_or_else(overflow)?;
        let total_sell_value = self
            .total_sell_value
            .checked_add(other.total_sell_value)
            .ok_or_else(overflow)?;
        let amount_paid_for = self
            .amount_paid_for
            .checked_add(other.amount_paid_for)
            .ok_or_else(overflow)?;

        self.amount = amount;
        self.total_buy_value = total_buy_value;
        self.total_sell_value = total_sell_value;
        self.amount_paid_for = amount_paid_for;
        Ok(())
    }

    /// Removes `sold` units, scaling every total down proportionally.
    pub fn sell(&mut self, sold: Decimal) -> Result<(), AggregateError> {
        if sold > self.amount {
            return Err(AggregateError::OversoldCommodity {
                commodity_type: self.commodity_type.clone(),
                requested: sold,
                held: self.amount,
            });
        }
        if self.amount.is_zero() {
            return Ok(());
        }

        // At most one, so the products below cannot overflow
        let share = sold / self.amount;
        self.total_buy_value -= self.total_buy_value * share;
        self.total_sell_value -= self.total_sell_value * share;
        self.amount_paid_for -= self.amount_paid_for * share;
        self.amount -= sold;
        Ok(())
    }

    /// Share of the market buy value actually paid, in percent.
    pub fn bought_for_percentage(&self) -> Option<Decimal> {
        if self.total_buy_value.is_zero() {
            return None;
        }
        Decimal::ONE_HUNDRED
            .checked_mul(self.amount_paid_for)?
            .checked_div(self.total_buy_value)
    }
}

/// Apportions `price_paid` over the appraisal lines by their share of the
/// appraisal's buy value and merges each line into `aggregation`.
pub fn apply_appraisal(
    aggregation: &mut Aggregation,
    appraisal_id: &str,
    price_paid: Decimal,
    appraisal: &Appraisal,
) -> Result<(), AggregateError> {
    if appraisal.total_buy_value.is_zero() {
        return Err(AggregateError::ZeroBuyValue {
            appraisal_id: appraisal_id.to_string(),
        });
    }

    let paid_ratio = price_paid
        .checked_div(appraisal.total_buy_value)
        .ok_or_else(|| AggregateError::Overflow {
            commodity_type: format!("appraisal {appraisal_id}"),
        })?;
    debug!(
        appraisal_id,
        %paid_ratio,
        lines = appraisal.lines.len(),
        "Applying appraisal"
    );

    for line in &appraisal.lines {
        let line_paid =
            line.buy_total
                .checked_mul(paid_ratio)
                .ok_or_else(|| AggregateError::Overflow {
                    commodity_type: line.commodity_type.clone(),
                })?;
        let seeded = AggregatedCommodity::from_line(line, line_paid);

        match aggregation.get_mut(&line.commodity_type) {
            Some(existing) => existing.merge(&seeded)?,
            None => {
                aggregation.insert(line.commodity_type.clone(), seeded);
            }
        }
    }

    Ok(())
}

pub fn apply_sale(aggregation: &mut Aggregation, sale: &SaleEvent) -> Result<(), AggregateError> {
    let existing = aggregation.get_mut(&sale.commodity_type).ok_or_else(|| {
        AggregateError::UnknownCommodity {
            commodity_type: sale.commodity_type.clone(),
        }
    })?;

    existing.sell(sale.amount)?;
    if existing.amount.is_zero() {
        aggregation.remove(&sale.commodity_type);
    }
    Ok(())
}

/// Rebuilds the per-commodity aggregation from the full ledger.
///
/// Appraisals are fetched one at a time in ledger order. Nothing is carried
/// over between calls. `update_callback` is invoked once per processed event.
pub async fn aggregate(
    events: &[LedgerEvent],
    provider: &(dyn AppraisalProvider),
    update_callback: &(dyn Fn()),
) -> Result<Aggregation> {
    let mut aggregation = Aggregation::new();

    for event in events {
        match event {
            LedgerEvent::Buyback(buyback) => {
                let appraisal = provider
                    .fetch_appraisal(&buyback.appraisal_id)
                    .await
                    .with_context(|| {
                        format!("Failed to fetch appraisal {}", buyback.appraisal_id)
                    })?;
                apply_appraisal(
                    &mut aggregation,
                    &buyback.appraisal_id,
                    buyback.price_paid,
                    &appraisal,
                )?;
            }
            LedgerEvent::Sale(sale) => apply_sale(&mut aggregation, sale)?,
        }
        update_callback();
    }

    Ok(aggregation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::appraisal::OrePrice;
    use crate::core::ledger::BuybackEvent;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockAppraisals {
        appraisals: HashMap<String, Appraisal>,
        call_count: AtomicUsize,
    }

    impl MockAppraisals {
        fn new(entries: Vec<(&str, Appraisal)>) -> Self {
            Self {
                appraisals: entries
                    .into_iter()
                    .map(|(id, a)| (id.to_string(), a))
                    .collect(),
                call_count: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AppraisalProvider for MockAppraisals {
        async fn fetch_appraisal(&self, appraisal_id: &str) -> anyhow::Result<Appraisal> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.appraisals
                .get(appraisal_id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("Unknown appraisal {appraisal_id}"))
        }

        async fn fetch_ore_prices(&self) -> anyhow::Result<Vec<OrePrice>> {
            Ok(vec![])
        }
    }

    fn line(commodity_type: &str, volume: Decimal, buy: Decimal, sell: Decimal) -> AppraisalLine {
        AppraisalLine {
            commodity_type: commodity_type.to_string(),
            amount: volume * dec!(100),
            volume,
            buy_total: buy,
            sell_total: sell,
        }
    }

    fn buyback(price: Decimal, id: &str) -> LedgerEvent {
        LedgerEvent::Buyback(BuybackEvent::new(price, id))
    }

    fn mixed_appraisal() -> Appraisal {
        Appraisal {
            total_buy_value: dec!(4000),
            lines: vec![
                line("Compressed Veldspar", dec!(10), dec!(3000), dec!(3600)),
                line("Compressed Sylvite", dec!(4), dec!(1000), dec!(1100)),
            ],
        }
    }

    #[tokio::test]
    async fn test_single_buyback_end_to_end() {
        let provider = MockAppraisals::new(vec![(
            "X",
            Appraisal {
                total_buy_value: dec!(2000),
                lines: vec![line("Veldspar", dec!(10), dec!(2000), dec!(2500))],
            },
        )]);

        let result = aggregate(&[buyback(dec!(1000), "X")], &provider, &|| {})
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        let veldspar = &result["Veldspar"];
        assert_eq!(
            *veldspar,
            AggregatedCommodity {
                commodity_type: "Veldspar".to_string(),
                amount: dec!(10),
                total_buy_value: dec!(2000),
                total_sell_value: dec!(2500),
                amount_paid_for: dec!(1000),
            }
        );
        assert_eq!(veldspar.bought_for_percentage(), Some(dec!(50)));
    }

    #[tokio::test]
    async fn test_split_buybacks_match_single_buyback() {
        let provider = MockAppraisals::new(vec![("lot", mixed_appraisal())]);

        let split = aggregate(
            &[
                buyback(dec!(1000), "lot"),
                buyback(dec!(600), "lot"),
                buyback(dec!(400), "lot"),
            ],
            &provider,
            &|| {},
        )
        .await
        .unwrap();
        let single = aggregate(&[buyback(dec!(2000), "lot")], &provider, &|| {})
            .await
            .unwrap();

        for (commodity_type, whole) in &single {
            let parts = &split[commodity_type];
            assert_eq!(parts.amount_paid_for, whole.amount_paid_for);
            assert_eq!(parts.amount, whole.amount * dec!(3));
            assert_eq!(parts.total_buy_value, whole.total_buy_value * dec!(3));
        }
        assert_eq!(split["Compressed Veldspar"].amount_paid_for, dec!(1500));
        assert_eq!(split["Compressed Sylvite"].amount_paid_for, dec!(500));
    }

    #[tokio::test]
    async fn test_apportioned_amounts_sum_to_price_paid() {
        let provider = MockAppraisals::new(vec![("lot", mixed_appraisal())]);
        let result = aggregate(&[buyback(dec!(3000), "lot")], &provider, &|| {})
            .await
            .unwrap();

        let paid: Decimal = result.values().map(|c| c.amount_paid_for).sum();
        assert_eq!(paid, dec!(3000));
    }

    #[tokio::test]
    async fn test_aggregate_calls_provider_once_per_buyback_and_reports_progress() {
        let provider = MockAppraisals::new(vec![("lot", mixed_appraisal())]);
        let progress = AtomicUsize::new(0);

        aggregate(
            &[buyback(dec!(1), "lot"), buyback(dec!(2), "lot")],
            &provider,
            &|| {
                progress.fetch_add(1, Ordering::SeqCst);
            },
        )
        .await
        .unwrap();

        assert_eq!(provider.call_count.load(Ordering::SeqCst), 2);
        assert_eq!(progress.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_aggregate_propagates_fetch_failure() {
        let provider = MockAppraisals::new(vec![]);
        let err = aggregate(&[buyback(dec!(1), "missing")], &provider, &|| {})
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch appraisal missing");
    }

    #[test]
    fn test_full_price_buyback_is_one_hundred_percent() {
        let appraisal = mixed_appraisal();
        let mut aggregation = Aggregation::new();
        apply_appraisal(&mut aggregation, "lot", dec!(4000), &appraisal).unwrap();

        for commodity in aggregation.values() {
            assert_eq!(commodity.bought_for_percentage(), Some(dec!(100)));
        }
    }

    #[test]
    fn test_zero_buy_value_is_rejected() {
        let appraisal = Appraisal {
            total_buy_value: Decimal::ZERO,
            lines: vec![line("Veldspar", dec!(1), dec!(0), dec!(0))],
        };
        let mut aggregation = Aggregation::new();

        let err = apply_appraisal(&mut aggregation, "empty", dec!(10), &appraisal).unwrap_err();
        assert_eq!(
            err,
            AggregateError::ZeroBuyValue {
                appraisal_id: "empty".to_string()
            }
        );
        assert!(aggregation.is_empty());
    }

    #[test]
    fn test_oversized_values_are_rejected_without_panicking() {
        let mut aggregation = Aggregation::new();
        let appraisal = Appraisal {
            total_buy_value: dec!(0.0000001),
            lines: vec![line("Veldspar", dec!(10), dec!(0.0000001), dec!(1))],
        };
        assert!(matches!(
            apply_appraisal(&mut aggregation, "tiny", Decimal::MAX, &appraisal),
            Err(AggregateError::Overflow { .. })
        ));

        let huge = Appraisal {
            total_buy_value: Decimal::MAX,
            lines: vec![line("Veldspar", dec!(10), Decimal::MAX, dec!(1))],
        };
        apply_appraisal(&mut aggregation, "huge", Decimal::ZERO, &huge).unwrap();
        assert_eq!(
            apply_appraisal(&mut aggregation, "huge", Decimal::ZERO, &huge),
            Err(AggregateError::Overflow {
                commodity_type: "Veldspar".to_string()
            })
        );
        assert_eq!(aggregation["Veldspar"].total_buy_value, Decimal::MAX);
    }

    #[test]
    fn test_merge_sums_every_field() {
        let mut a = AggregatedCommodity {
            commodity_type: "A".to_string(),
            amount: dec!(1),
            total_buy_value: dec!(10),
            total_sell_value: dec!(12),
            amount_paid_for: dec!(8),
        };
        let b = AggregatedCommodity {
            commodity_type: "A".to_string(),
            amount: dec!(2),
            total_buy_value: dec!(20),
            total_sell_value: dec!(24),
            amount_paid_for: dec!(15),
        };

        a.merge(&b).unwrap();
        assert_eq!(a.amount, dec!(3));
        assert_eq!(a.total_buy_value, dec!(30));
        assert_eq!(a.total_sell_value, dec!(36));
        assert_eq!(a.amount_paid_for, dec!(23));
    }

    #[test]
    fn test_merge_rejects_different_types() {
        let mut a = AggregatedCommodity::from_line(&line("A", dec!(1), dec!(1), dec!(1)), dec!(1));
        let b = AggregatedCommodity::from_line(&line("B", dec!(1), dec!(1), dec!(1)), dec!(1));

        assert_eq!(
            a.merge(&b),
            Err(AggregateError::TypeMismatch {
                expected: "A".to_string(),
                found: "B".to_string()
            })
        );
        assert_eq!(a.amount, dec!(1));
    }

    #[test]
    fn test_sale_scales_totals_down() {
        let mut aggregation = Aggregation::new();
        apply_appraisal(&mut aggregation, "lot", dec!(2000), &mixed_appraisal()).unwrap();

        apply_sale(
            &mut aggregation,
            &SaleEvent::new("Compressed Veldspar", dec!(4), dec!(1500)),
        )
        .unwrap();

        let veldspar = &aggregation["Compressed Veldspar"];
        assert_eq!(veldspar.amount, dec!(6));
        assert_eq!(veldspar.total_buy_value, dec!(1800));
        assert_eq!(veldspar.total_sell_value, dec!(2160));
        assert_eq!(veldspar.amount_paid_for, dec!(900));
    }

    #[test]
    fn test_selling_everything_removes_commodity() {
        let mut aggregation = Aggregation::new();
        apply_appraisal(&mut aggregation, "lot", dec!(2000), &mixed_appraisal()).unwrap();

        apply_sale(
            &mut aggregation,
            &SaleEvent::new("Compressed Sylvite", dec!(4), dec!(1000)),
        )
        .unwrap();
        assert!(!aggregation.contains_key("Compressed Sylvite"));
    }

    #[test]
    fn test_invalid_sales_are_rejected() {
        let mut aggregation = Aggregation::new();
        apply_appraisal(&mut aggregation, "lot", dec!(2000), &mixed_appraisal()).unwrap();

        assert!(matches!(
            apply_sale(&mut aggregation, &SaleEvent::new("Tritanium", dec!(1), dec!(1))),
            Err(AggregateError::UnknownCommodity { .. })
        ));
        assert!(matches!(
            apply_sale(
                &mut aggregation,
                &SaleEvent::new("Compressed Sylvite", dec!(5), dec!(1))
            ),
            Err(AggregateError::OversoldCommodity { .. })
        ));
    }

    #[tokio::test]
    async fn test_aggregation_orders_by_type() {
        let provider = MockAppraisals::new(vec![("lot", mixed_appraisal())]);
        let result = aggregate(&[buyback(dec!(1), "lot")], &provider, &|| {})
            .await
            .unwrap();

        let keys: Vec<&str> = result.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Compressed Sylvite", "Compressed Veldspar"]);
    }
}
