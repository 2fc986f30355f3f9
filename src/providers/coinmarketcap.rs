use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::coin::{CoinStat, MarketDataProvider};
use crate::core::currency::RateOracle;
use crate::core::error::EtfError;

// CoinMarketCapProvider implementation for MarketDataProvider
pub struct CoinMarketCapProvider {
    base_url: String,
}

impl CoinMarketCapProvider {
    pub fn new(base_url: &str) -> Self {
        CoinMarketCapProvider {
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct DetailResponse {
    data: DetailData,
}

#[derive(Deserialize, Debug)]
struct DetailData {
    statistics: CoinStatistics,
}

#[derive(Deserialize, Debug)]
struct CoinStatistics {
    #[serde(rename = "marketCap")]
    market_cap: Option<f64>,
    #[serde(rename = "circulatingSupply")]
    circulating_supply: Option<f64>,
    price: Option<f64>,
}

fn data_source_error(slug: &str, reason: impl Into<String>) -> EtfError {
    EtfError::DataSource {
        symbol: slug.to_string(),
        reason: reason.into(),
    }
}

#[async_trait]
impl MarketDataProvider for CoinMarketCapProvider {
    #[instrument(
        name = "CoinMarketCapFetch",
        skip(self),
        fields(slug = %slug)
    )]
    async fn fetch_coin_stat(&self, slug: &str) -> Result<CoinStat, EtfError> {
        let url = format!(
            "{}/data-api/v3/cryptocurrency/detail?slug={}",
            self.base_url, slug
        );
        debug!("Requesting coin statistics from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("algoetf/1.0")
            .build()
            .map_err(|e| data_source_error(slug, e.to_string()))?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| data_source_error(slug, format!("request error: {e}")))?;

        if !response.status().is_success() {
            return Err(data_source_error(
                slug,
                format!("HTTP error: {}", response.status()),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| data_source_error(slug, e.to_string()))?;
        let detail: DetailResponse = serde_json::from_str(&text)
            .map_err(|e| data_source_error(slug, format!("failed to parse response: {e}")))?;

        let stats = detail.data.statistics;
        Ok(CoinStat {
            symbol: slug.to_string(),
            market_cap: stats
                .market_cap
                .ok_or_else(|| data_source_error(slug, "missing field: marketCap"))?,
            circulating_supply: stats
                .circulating_supply
                .ok_or_else(|| data_source_error(slug, "missing field: circulatingSupply"))?,
            price: stats
                .price
                .ok_or_else(|| data_source_error(slug, "missing field: price"))?,
        })
    }
}

// The settlement rate comes from the same data source: the spot price of
// the base currency's own listing.
#[async_trait]
impl RateOracle for CoinMarketCapProvider {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64, EtfError> {
        let pair = format!("{from}/{to}");
        let slug = match (from, to) {
            ("ALGO", "USD") => "algorand",
            _ => {
                return Err(EtfError::DataSource {
                    symbol: pair,
                    reason: "unsupported currency pair".to_string(),
                });
            }
        };

        let stat = self.fetch_coin_stat(slug).await?;
        debug!("Fetched {} rate: {}", pair, stat.price);
        Ok(stat.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(slug: &str, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data-api/v3/cryptocurrency/detail"))
            .and(query_param("slug", slug))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[tokio::test]
    async fn test_successful_stat_fetch() {
        let mock_response = r#"{
            "data": {
                "statistics": {
                    "marketCap": 2500000000.0,
                    "circulatingSupply": 8000000000.0,
                    "price": 0.3125
                }
            }
        }"#;

        let mock_server = create_mock_server("algorand", mock_response).await;
        let provider = CoinMarketCapProvider::new(&mock_server.uri());

        let stat = provider.fetch_coin_stat("algorand").await.unwrap();
        assert_eq!(stat.symbol, "algorand");
        assert_eq!(stat.market_cap, 2500000000.0);
        assert_eq!(stat.circulating_supply, 8000000000.0);
        assert_eq!(stat.price, 0.3125);
    }

    #[tokio::test]
    async fn test_missing_field_is_a_data_source_error() {
        let mock_response = r#"{
            "data": {
                "statistics": {
                    "marketCap": 2500000000.0,
                    "price": 0.3125
                }
            }
        }"#;

        let mock_server = create_mock_server("algorand", mock_response).await;
        let provider = CoinMarketCapProvider::new(&mock_server.uri());

        let result = provider.fetch_coin_stat("algorand").await;
        match result {
            Err(EtfError::DataSource { symbol, reason }) => {
                assert_eq!(symbol, "algorand");
                assert_eq!(reason, "missing field: circulatingSupply");
            }
            other => panic!("expected DataSource error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_error_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data-api/v3/cryptocurrency/detail"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let provider = CoinMarketCapProvider::new(&mock_server.uri());
        let result = provider.fetch_coin_stat("tezos").await;
        match result {
            Err(EtfError::DataSource { symbol, reason }) => {
                assert_eq!(symbol, "tezos");
                assert_eq!(reason, "HTTP error: 500 Internal Server Error");
            }
            other => panic!("expected DataSource error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_response = r#"{"data": {"stats": {}}}"#;
        let mock_server = create_mock_server("dash", mock_response).await;
        let provider = CoinMarketCapProvider::new(&mock_server.uri());

        let result = provider.fetch_coin_stat("dash").await;
        match result {
            Err(EtfError::DataSource { reason, .. }) => {
                assert!(reason.contains("failed to parse response"));
            }
            other => panic!("expected DataSource error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_algo_usd_rate_is_the_algorand_spot_price() {
        let mock_response = r#"{
            "data": {
                "statistics": {
                    "marketCap": 2500000000.0,
                    "circulatingSupply": 8000000000.0,
                    "price": 0.3125
                }
            }
        }"#;

        let mock_server = create_mock_server("algorand", mock_response).await;
        let provider = CoinMarketCapProvider::new(&mock_server.uri());

        let rate = provider.get_rate("ALGO", "USD").await.unwrap();
        assert_eq!(rate, 0.3125);
    }

    #[tokio::test]
    async fn test_unsupported_pair_is_rejected() {
        let mock_server = MockServer::start().await;
        let provider = CoinMarketCapProvider::new(&mock_server.uri());

        let result = provider.get_rate("BTC", "EUR").await;
        match result {
            Err(EtfError::DataSource { symbol, reason }) => {
                assert_eq!(symbol, "BTC/EUR");
                assert_eq!(reason, "unsupported currency pair");
            }
            other => panic!("expected DataSource error, got {other:?}"),
        }
    }
}
