use super::ui;
use crate::providers::indexer::IndexerClient;
use anyhow::Result;
use comfy_table::Cell;

pub async fn run(indexer: &IndexerClient, asset_id: u64, address: &str) -> Result<()> {
    let pb = ui::new_spinner("Fetching transfer history...");
    let records = indexer.asset_transfers(address, asset_id).await;
    pb.finish_and_clear();

    let records = records?;
    if records.is_empty() {
        println!("No index token transfers found for {address}");
        return Ok(());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Round"),
        ui::header_cell("Sender"),
        ui::header_cell("Receiver"),
        ui::header_cell("Amount"),
        ui::header_cell("Fee (µALGO)"),
    ]);

    for record in &records {
        table.add_row(vec![
            ui::format_optional_cell(record.round, |r| r.to_string()),
            Cell::new(&record.sender),
            Cell::new(&record.receiver),
            ui::amount_cell(record.amount.to_string()),
            ui::amount_cell(record.fee.to_string()),
        ]);
    }

    println!("{table}");
    println!(
        "\n{} {}",
        ui::style_text("Transfers:", ui::StyleType::TotalLabel),
        records.len()
    );
    Ok(())
}
