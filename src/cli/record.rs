use crate::App;
use crate::core::aggregate;
use crate::core::ledger::{BuybackEvent, LedgerEvent, SaleEvent, validate_buyback_price};
use anyhow::{Context, Result, bail};
use rust_decimal::Decimal;
use tracing::info;

/// Records a buyback without going through the watch console.
pub async fn add(app: &App, price: Decimal, appraisal_id: &str) -> Result<()> {
    let price = validate_buyback_price(price)?;

    app.ledger
        .append(LedgerEvent::Buyback(BuybackEvent::new(price, appraisal_id)))
        .await?;
    println!("Recorded buyback of {appraisal_id} for {price} ISK");
    Ok(())
}

/// Records a sale after checking it against the current holdings.
pub async fn sell(app: &App, commodity_type: &str, amount: Decimal, proceeds: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        bail!("Sold amount must be positive: {amount}");
    }

    let sale = SaleEvent::new(commodity_type, amount, proceeds);

    let events = app.ledger.events().await?;
    let mut holdings = aggregate::aggregate(&events, app.appraisals.as_ref(), &|| {}).await?;
    aggregate::apply_sale(&mut holdings, &sale)
        .with_context(|| format!("Cannot record sale of {commodity_type}"))?;

    info!(commodity_type, %amount, %proceeds, "Sale validated");
    app.ledger.append(LedgerEvent::Sale(sale)).await?;
    println!("Recorded sale of {amount} {commodity_type} for {proceeds} ISK");
    Ok(())
}
