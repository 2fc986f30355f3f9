//! Basket membership and per-coin market statistics.

use crate::core::error::EtfError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The proof-of-stake coins composing the index, as market-data slugs.
pub const DEFAULT_BASKET: [&str; 10] = [
    "algorand",
    "cardano",
    "tezos",
    "dash",
    "polkadot",
    "cosmos",
    "the-graph",
    "stellar",
    "solana",
    "near-protocol",
];

/// Snapshot of one coin's market statistics, fetched fresh for every
/// valuation and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinStat {
    pub symbol: String,
    pub market_cap: f64,
    pub circulating_supply: f64,
    pub price: f64,
}

/// Ordered set of coin slugs defining the fund composition. Fixed at build
/// time; every slug must resolve to a [`CoinStat`] or the valuation fails.
#[derive(Debug, Clone)]
pub struct Basket {
    slugs: Vec<String>,
}

impl Basket {
    pub fn new(slugs: Vec<String>) -> Self {
        Basket { slugs }
    }

    /// The default proof-of-stake basket.
    pub fn proof_of_stake() -> Self {
        Basket::new(DEFAULT_BASKET.iter().map(|s| s.to_string()).collect())
    }

    pub fn slugs(&self) -> &[String] {
        &self.slugs
    }

    pub fn len(&self) -> usize {
        self.slugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_coin_stat(&self, slug: &str) -> Result<CoinStat, EtfError>;
}
