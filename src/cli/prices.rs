use super::ui;
use crate::App;
use crate::core::appraisal::OrePrice;
use anyhow::Result;
use comfy_table::Cell;

pub fn display_as_table(prices: &[OrePrice]) -> String {
    let mut sorted: Vec<&OrePrice> = prices.iter().collect();
    sorted.sort_by(|a, b| a.commodity_type.cmp(&b.commodity_type));

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Ore"),
        ui::header_cell("Buy"),
        ui::header_cell("Sell"),
        ui::header_cell("Split"),
    ]);

    for price in sorted {
        table.add_row(vec![
            Cell::new(&price.commodity_type),
            ui::isk_cell(price.buy_price),
            ui::isk_cell(price.sell_price),
            ui::isk_cell(price.split_price()),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Ore prices (Jita)", ui::StyleType::Title),
        table
    )
}

pub async fn run(app: &App) -> Result<()> {
    let prices = app.appraisals.fetch_ore_prices().await?;
    println!("{}", display_as_table(&prices));
    Ok(())
}
