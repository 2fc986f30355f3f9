//! Core business logic abstractions

pub mod coin;
pub mod compose;
pub mod currency;
pub mod error;
pub mod ledger;
pub mod log;
pub mod nav;
pub mod txn;

// Re-export main types for cleaner imports
pub use coin::{Basket, CoinStat, MarketDataProvider};
pub use currency::RateOracle;
pub use error::EtfError;
pub use ledger::{LedgerClient, NetworkParams};
pub use nav::WeightingStrategy;
