//! Net-asset-value computation for the index token.
//!
//! The engine fans out one market-data request per basket member, joins all of
//! them, and folds the statistics into a single fund valuation under the
//! selected weighting strategy. There is no partial-basket fallback: a single
//! failed fetch invalidates the whole valuation.

use crate::core::coin::{Basket, CoinStat, MarketDataProvider};
use crate::core::error::EtfError;
use anyhow::Result;
use futures::future::join_all;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use tracing::debug;

/// How the basket statistics are folded into one index price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightingStrategy {
    /// `sum(market_cap) / sum(circulating_supply)`: the basket is treated as
    /// one pooled fund with zero liabilities, with the aggregate circulating
    /// supply standing in for shares outstanding.
    MarketCapWeighted,
    /// `sum(price_i / N)`: each coin contributes an equal fraction of its
    /// spot price to the index price.
    EqualProportion,
}

impl Display for WeightingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                WeightingStrategy::MarketCapWeighted => "market-cap",
                WeightingStrategy::EqualProportion => "equal",
            }
        )
    }
}

impl FromStr for WeightingStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "market-cap" => Ok(WeightingStrategy::MarketCapWeighted),
            "equal" => Ok(WeightingStrategy::EqualProportion),
            _ => Err(anyhow::anyhow!("Invalid weighting strategy: {}", s)),
        }
    }
}

/// Fetch statistics for every basket member concurrently.
///
/// All requests are joined before returning; any single failure aborts the
/// valuation with the failing symbol in the error.
pub async fn fetch_basket_stats(
    basket: &Basket,
    provider: &dyn MarketDataProvider,
) -> Result<HashMap<String, CoinStat>, EtfError> {
    let fetches = basket.slugs().iter().map(|slug| provider.fetch_coin_stat(slug));
    let results = join_all(fetches).await;

    let mut stats = HashMap::with_capacity(basket.len());
    for result in results {
        let stat = result?;
        stats.insert(stat.symbol.clone(), stat);
    }
    debug!("Fetched stats for {} basket members", stats.len());
    Ok(stats)
}

/// Fold fetched statistics into the fund price per index unit, rounded to
/// two decimals. Rounding is applied only here, never to intermediate sums.
pub fn compute_nav(
    stats: &HashMap<String, CoinStat>,
    strategy: WeightingStrategy,
) -> Result<f64, EtfError> {
    if stats.is_empty() {
        return Err(EtfError::DivisionByZero);
    }

    let value = match strategy {
        WeightingStrategy::MarketCapWeighted => {
            let total_market_cap: f64 = stats.values().map(|s| s.market_cap).sum();
            let total_circulating_supply: f64 =
                stats.values().map(|s| s.circulating_supply).sum();
            if total_circulating_supply == 0.0 {
                return Err(EtfError::DivisionByZero);
            }
            total_market_cap / total_circulating_supply
        }
        WeightingStrategy::EqualProportion => {
            let weight = 1.0 / stats.len() as f64;
            stats.values().map(|s| weight * s.price).sum()
        }
    };

    Ok((value * 100.0).round() / 100.0)
}

/// Fetch and price in one call. Valuations are recomputed from fresh data on
/// every request; there is no caching or staleness bound.
pub async fn basket_valuation(
    basket: &Basket,
    provider: &dyn MarketDataProvider,
    strategy: WeightingStrategy,
) -> Result<f64, EtfError> {
    let stats = fetch_basket_stats(basket, provider).await?;
    compute_nav(&stats, strategy)
}
