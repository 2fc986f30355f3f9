use super::ui;
use crate::core::coin::{Basket, MarketDataProvider};
use crate::core::nav::{self, WeightingStrategy};
use anyhow::Result;
use comfy_table::Cell;

/// Fetch the basket, print per-coin statistics and the resulting index price.
pub async fn run(market: &dyn MarketDataProvider, strategy: WeightingStrategy) -> Result<()> {
    let basket = Basket::proof_of_stake();

    let pb = ui::new_spinner("Fetching basket market data...");
    let stats = nav::fetch_basket_stats(&basket, market).await;
    pb.finish_and_clear();

    let stats = stats?;
    let nav_value = nav::compute_nav(&stats, strategy)?;

    let total_market_cap: f64 = stats.values().map(|s| s.market_cap).sum();

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Coin"),
        ui::header_cell("Price (USD)"),
        ui::header_cell("Market Cap (USD)"),
        ui::header_cell("Circulating Supply"),
        ui::header_cell("Weight (%)"),
    ]);

    // Basket order, not map order.
    for slug in basket.slugs() {
        let stat = &stats[slug];
        let weight = match strategy {
            WeightingStrategy::MarketCapWeighted => (total_market_cap > 0.0)
                .then(|| (stat.market_cap / total_market_cap) * 100.0),
            WeightingStrategy::EqualProportion => Some(100.0 / basket.len() as f64),
        };

        table.add_row(vec![
            Cell::new(slug),
            ui::amount_cell(format!("{:.4}", stat.price)),
            ui::amount_cell(format!("{:.0}", stat.market_cap)),
            ui::amount_cell(format!("{:.0}", stat.circulating_supply)),
            ui::format_optional_cell(weight, |w| format!("{w:.2}%")),
        ]);
    }

    println!(
        "Basket: {}\n",
        ui::style_text("Proof-of-Stake Index", ui::StyleType::Title)
    );
    println!("{table}");
    println!(
        "\nIndex price ({} USD, {} weighting): {}",
        ui::style_text("per unit", ui::StyleType::Subtle),
        strategy,
        ui::style_text(&format!("{nav_value:.2}"), ui::StyleType::TotalValue)
    );

    Ok(())
}
