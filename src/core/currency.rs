//! Base-currency rate abstractions

use crate::core::error::EtfError;
use async_trait::async_trait;

/// Spot exchange rate between two currencies, e.g. ALGO to USD. Used to
/// convert a USD fund valuation into the settlement currency.
#[async_trait]
pub trait RateOracle: Send + Sync {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64, EtfError>;
}
