use super::ui;
use crate::core::ledger::{self, LedgerClient};
use crate::credentials::Account;
use anyhow::Result;
use comfy_table::Cell;

pub async fn run(ledger: &dyn LedgerClient, asset_id: u64, account: &Account) -> Result<()> {
    let pb = ui::new_spinner("Fetching holdings...");
    let result = tokio::try_join!(
        ledger.account_holdings(&account.address),
        ledger.asset_params(asset_id)
    );
    pb.finish_and_clear();

    let (holdings, params) = result?;
    let amount = holdings
        .iter()
        .find(|h| h.asset_id == asset_id)
        .map_or(0, |h| h.amount);

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Account"),
        ui::header_cell("Address"),
        ui::header_cell("Balance"),
    ]);
    table.add_row(vec![
        Cell::new(&account.name),
        Cell::new(&account.address),
        ui::amount_cell(ledger::format_asset_amount(amount, &params)),
    ]);

    println!("{table}");
    Ok(())
}
