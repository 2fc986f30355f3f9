//! Typed failure taxonomy for valuation and settlement.

use thiserror::Error;

/// Errors surfaced by the NAV engine, the transaction composer and the
/// credential store. Nothing in here is retried automatically; every failure
/// is terminal at the point of detection and carries enough context (symbol,
/// leg, round count) for a precise user-facing message.
#[derive(Debug, Error)]
pub enum EtfError {
    #[error("market data fetch failed for {symbol}: {reason}")]
    DataSource { symbol: String, reason: String },

    #[error("aggregate circulating supply is zero, the index cannot be priced")]
    DivisionByZero,

    #[error("ledger rejected transaction {tx_id} on the {leg} leg: {reason}")]
    PoolRejection {
        leg: String,
        tx_id: String,
        reason: String,
    },

    #[error("transaction {tx_id} on the {leg} leg not confirmed within {rounds} rounds")]
    ConfirmationTimeout {
        leg: String,
        tx_id: String,
        rounds: u64,
    },

    #[error("confirmation wait for transaction {tx_id} on the {leg} leg was cancelled")]
    Cancelled { leg: String, tx_id: String },

    #[error("invalid address {address}: {reason}")]
    Address { address: String, reason: String },

    #[error("account {0:?} does not exist in the credentials file")]
    AccountName(String),

    #[error("ledger request failed: {reason}")]
    Ledger { reason: String },

    #[error("could not write transaction artifact {path}: {reason}")]
    Artifact { path: String, reason: String },

    /// A leg failed mid-settlement. `completed` lists the legs that already
    /// reached a terminal state so the caller can report exactly what landed.
    #[error("settlement halted on the {leg} leg (completed legs: {completed:?})")]
    Settlement {
        leg: String,
        completed: Vec<String>,
        #[source]
        source: Box<EtfError>,
    },
}
