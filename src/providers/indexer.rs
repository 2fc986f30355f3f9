//! Algorand indexer client for asset transfer history.

use serde::Deserialize;
use tracing::debug;

use crate::core::error::EtfError;

/// One settled index-token transfer pulled from the indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub sender: String,
    pub receiver: String,
    pub amount: u64,
    pub fee: u64,
    pub round: Option<u64>,
}

pub struct IndexerClient {
    base_url: String,
}

impl IndexerClient {
    pub fn new(base_url: &str) -> Self {
        IndexerClient {
            base_url: base_url.to_string(),
        }
    }

    /// All asset transfers of `asset_id` touching `address`. Transactions of
    /// other types in the response window are skipped.
    pub async fn asset_transfers(
        &self,
        address: &str,
        asset_id: u64,
    ) -> Result<Vec<TransferRecord>, EtfError> {
        let url = format!(
            "{}/v2/transactions?address={}&asset-id={}",
            self.base_url, address, asset_id
        );
        debug!("Requesting transaction history from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("algoetf/1.0")
            .build()
            .map_err(|e| EtfError::Ledger {
                reason: e.to_string(),
            })?;
        let response = client.get(&url).send().await.map_err(|e| EtfError::Ledger {
            reason: format!("history request error: {e}"),
        })?;

        if !response.status().is_success() {
            return Err(EtfError::Ledger {
                reason: format!("HTTP error: {} for transaction history", response.status()),
            });
        }

        let history: TransactionsResponse =
            response.json().await.map_err(|e| EtfError::Ledger {
                reason: format!("failed to parse transaction history: {e}"),
            })?;

        let records = history
            .transactions
            .into_iter()
            .filter_map(|txn| {
                txn.asset_transfer.map(|transfer| TransferRecord {
                    sender: txn.sender,
                    receiver: transfer.receiver,
                    amount: transfer.amount,
                    fee: txn.fee,
                    round: txn.confirmed_round,
                })
            })
            .collect();
        Ok(records)
    }
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    transactions: Vec<IndexedTransaction>,
}

#[derive(Debug, Deserialize)]
struct IndexedTransaction {
    sender: String,
    fee: u64,
    #[serde(rename = "confirmed-round", default)]
    confirmed_round: Option<u64>,
    #[serde(rename = "asset-transfer-transaction", default)]
    asset_transfer: Option<AssetTransferFields>,
}

#[derive(Debug, Deserialize)]
struct AssetTransferFields {
    amount: u64,
    receiver: String,
}
