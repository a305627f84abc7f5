use super::ui;
use crate::App;
use crate::core::aggregate;
use crate::core::analytics::{self, ProfitParams, ProfitReport};
use crate::core::freight::FreightRoute;
use anyhow::{Context, Result};
use comfy_table::Cell;
use tokio_util::sync::CancellationToken;
use tracing::debug;

impl ProfitReport {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("Commodity"),
            ui::header_cell("Volume (m3)"),
            ui::header_cell("Buy value"),
            ui::header_cell("Paid"),
            ui::header_cell("Paid (%)"),
            ui::header_cell("Break-even"),
            ui::header_cell("Per unit"),
            ui::header_cell("Sell value"),
        ]);

        for row in &self.rows {
            let commodity = &row.commodity;
            let profitable = row.is_profitable();

            table.add_row(vec![
                Cell::new(&commodity.commodity_type),
                ui::format_optional_cell(Some(commodity.amount), |a| a.floor().to_string()),
                ui::isk_cell(commodity.total_buy_value),
                ui::isk_cell(commodity.amount_paid_for),
                ui::format_optional_cell(row.bought_for_percentage, ui::format_percentage),
                ui::profit_cell(ui::format_isk(row.break_even_sell_price.ceil()), profitable),
                match row.break_even_per_unit {
                    Some(per_unit) => ui::profit_cell(ui::format_isk(per_unit.ceil()), profitable),
                    None => ui::format_optional_cell(None::<String>, |s| s),
                },
                ui::isk_cell(commodity.total_sell_value),
            ]);
        }

        let mut output = format!(
            "{}\n\n",
            ui::style_text("EVE Profits", ui::StyleType::Title)
        );

        if self.rows.is_empty() {
            output.push_str(&ui::style_text(
                "No buybacks recorded yet.",
                ui::StyleType::Subtle,
            ));
            return output;
        }

        output.push_str(&table.to_string());

        output.push_str(&format!(
            "\n\n{} {}   {} {}   {} {}",
            ui::style_text("Buy value:", ui::StyleType::TotalLabel),
            ui::format_isk(self.total_buy_value),
            ui::style_text("Paid:", ui::StyleType::TotalLabel),
            ui::format_isk(self.total_paid),
            ui::style_text("Sell value:", ui::StyleType::TotalLabel),
            ui::style_text(
                &ui::format_isk(self.total_sell_value),
                ui::StyleType::TotalValue
            ),
        ));

        output
    }
}

/// One full cycle: quote freight, re-read the ledger, re-aggregate.
pub async fn build_report(app: &App, cancel: &CancellationToken) -> Result<ProfitReport> {
    let freight = &app.config.freight;
    let route = FreightRoute::new(&freight.origin, &freight.destination);
    let quote = app
        .freight
        .fetch_quote(&route, freight.volume, freight.collateral, cancel)
        .await
        .context("Failed to fetch freight quote")?;
    let params = ProfitParams::new(app.config.fee_rate, quote, freight.collateral)?;
    debug!(?params, "Freight quote {} for reference contract", quote);

    let events = app.ledger.events().await?;

    let pb = ui::new_progress_bar(events.len() as u64, true);
    pb.set_message("Fetching appraisals...");
    let aggregation = aggregate::aggregate(&events, app.appraisals.as_ref(), &|| pb.inc(1)).await;
    pb.finish_and_clear();

    Ok(analytics::calculate_profits(&aggregation?, &params))
}

pub async fn run(app: &App, cancel: &CancellationToken) -> Result<()> {
    let report = build_report(app, cancel).await?;
    println!("{}", report.display_as_table());
    Ok(())
}
