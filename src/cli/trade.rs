use super::ui;
use crate::core::compose::{
    Composer, IntentKind, LegOutcome, Settlement, TradeIntent, TradeParty,
};
use anyhow::Result;
use comfy_table::Cell;

/// Drive a buy/sell intent to settlement and report every leg's outcome.
pub async fn run(
    composer: &Composer<'_>,
    kind: IntentKind,
    fund: TradeParty,
    account: TradeParty,
    units: u64,
) -> Result<()> {
    println!(
        "{} {} unit(s) of the index token",
        ui::style_text(
            match kind {
                IntentKind::Buy => "Buying",
                IntentKind::Sell => "Selling",
                IntentKind::Exchange => "Exchanging",
            },
            ui::StyleType::Title
        ),
        units
    );
    println!(
        "  fund pool: {}\n  account:   {}\n",
        ui::style_text(&fund.address, ui::StyleType::Subtle),
        ui::style_text(&account.address, ui::StyleType::Subtle),
    );

    let intent = TradeIntent::assign(kind, fund, account, units);

    let pb = ui::new_spinner("Quoting and settling...");
    let settlement = composer.settle(intent).await;
    pb.finish_and_clear();

    display_settlement(&settlement?);
    Ok(())
}

fn display_settlement(settlement: &Settlement) {
    let quote = &settlement.quote;
    println!(
        "{} {:.2} USD/unit at {:.4} USD/ALGO, settling {:.6} ALGO",
        ui::style_text("Quoted:", ui::StyleType::TotalLabel),
        quote.nav,
        quote.algo_rate,
        quote.algo_amount
    );

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Leg"),
        ui::header_cell("Outcome"),
        ui::header_cell("Detail"),
    ]);

    for receipt in &settlement.receipts {
        let (outcome, detail) = match &receipt.outcome {
            LegOutcome::Confirmed { tx_id, round } => (
                ui::style_text("Confirmed", ui::StyleType::TotalValue),
                format!("tx {tx_id} in round {round}"),
            ),
            LegOutcome::UnsignedPersisted { path } => (
                ui::style_text("Unsigned", ui::StyleType::Subtle),
                format!("written to {} for out-of-band signing", path.display()),
            ),
        };
        table.add_row(vec![
            Cell::new(receipt.kind.to_string()),
            Cell::new(outcome),
            Cell::new(detail),
        ]);
    }

    println!("\n{table}");
}
