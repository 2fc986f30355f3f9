//! Ledger client abstractions

use crate::core::error::EtfError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Network parameters for transaction construction. Captured once per
/// transaction set and shared by every leg so that all legs target the same
/// validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    /// Flat fee in microalgos.
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    /// Decoded 32-byte genesis hash.
    pub genesis_hash: Vec<u8>,
}

/// Status of a submitted transaction as reported by the node's pending pool.
#[derive(Debug, Clone, Default)]
pub struct PendingStatus {
    /// Round the transaction was confirmed in; zero while still pending.
    pub confirmed_round: u64,
    /// Non-empty when the pool rejected the transaction outright.
    pub pool_error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetHolding {
    pub asset_id: u64,
    pub amount: u64,
}

/// Display-relevant parameters of an asset, for balance formatting.
#[derive(Debug, Clone)]
pub struct AssetParams {
    pub decimals: u32,
    pub unit_name: Option<String>,
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn suggested_params(&self) -> Result<NetworkParams, EtfError>;

    /// Submit raw signed transaction bytes, returning the transaction id.
    async fn submit(&self, signed: &[u8]) -> Result<String, EtfError>;

    async fn last_round(&self) -> Result<u64, EtfError>;

    /// Block until the ledger has advanced past the given round.
    async fn wait_for_round_after(&self, round: u64) -> Result<(), EtfError>;

    async fn pending_transaction(&self, tx_id: &str) -> Result<PendingStatus, EtfError>;

    async fn account_holdings(&self, address: &str) -> Result<Vec<AssetHolding>, EtfError>;

    async fn asset_params(&self, asset_id: u64) -> Result<AssetParams, EtfError>;
}

/// Formats a base-unit asset amount using the asset's decimals and unit name.
pub fn format_asset_amount(amount: u64, params: &AssetParams) -> String {
    let scaled = amount as f64 / 10f64.powi(params.decimals as i32);
    match &params.unit_name {
        Some(unit) => format!("{scaled} {unit}"),
        None => scaled.to_string(),
    }
}
