//! Algorand node (algod v2) REST client.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::Deserialize;
use tracing::debug;

use crate::core::error::EtfError;
use crate::core::ledger::{
    AssetHolding, AssetParams, LedgerClient, NetworkParams, PendingStatus,
};

/// Rounds a transaction stays valid for, counted from the round the
/// parameter snapshot was taken at.
const VALIDITY_WINDOW: u64 = 1000;

pub struct AlgodClient {
    base_url: String,
    token: Option<String>,
}

impl AlgodClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        AlgodClient {
            base_url: base_url.to_string(),
            token: token.map(|t| t.to_string()),
        }
    }

    fn client(&self) -> Result<reqwest::Client, EtfError> {
        reqwest::Client::builder()
            .user_agent("algoetf/1.0")
            .build()
            .map_err(|e| EtfError::Ledger {
                reason: e.to_string(),
            })
    }

    fn request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header("X-Algo-API-Token", token),
            None => request,
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, EtfError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Requesting {}", url);

        let response = self
            .request(self.client()?.get(&url))
            .send()
            .await
            .map_err(|e| EtfError::Ledger {
                reason: format!("request error for {path}: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(EtfError::Ledger {
                reason: format!("HTTP error: {} for {path}", response.status()),
            });
        }

        response.json::<T>().await.map_err(|e| EtfError::Ledger {
            reason: format!("failed to parse response for {path}: {e}"),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TransactionParamsResponse {
    #[serde(rename = "min-fee")]
    min_fee: u64,
    #[serde(rename = "genesis-hash")]
    genesis_hash: String,
    #[serde(rename = "genesis-id")]
    genesis_id: String,
    #[serde(rename = "last-round")]
    last_round: u64,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(rename = "txId")]
    tx_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(rename = "last-round")]
    last_round: u64,
}

#[derive(Debug, Deserialize)]
struct PendingResponse {
    #[serde(rename = "confirmed-round", default)]
    confirmed_round: Option<u64>,
    #[serde(rename = "pool-error", default)]
    pool_error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    #[serde(default)]
    assets: Vec<AccountAsset>,
}

#[derive(Debug, Deserialize)]
struct AccountAsset {
    #[serde(rename = "asset-id")]
    asset_id: u64,
    amount: u64,
}

#[derive(Debug, Deserialize)]
struct AssetResponse {
    params: AssetParamsFields,
}

#[derive(Debug, Deserialize)]
struct AssetParamsFields {
    #[serde(default)]
    decimals: u32,
    #[serde(rename = "unit-name", default)]
    unit_name: Option<String>,
}

#[async_trait]
impl LedgerClient for AlgodClient {
    async fn suggested_params(&self) -> Result<NetworkParams, EtfError> {
        let params: TransactionParamsResponse = self.get_json("/v2/transactions/params").await?;

        let genesis_hash =
            BASE64
                .decode(&params.genesis_hash)
                .map_err(|e| EtfError::Ledger {
                    reason: format!("genesis hash is not valid base64: {e}"),
                })?;

        Ok(NetworkParams {
            fee: params.min_fee,
            first_valid: params.last_round,
            last_valid: params.last_round + VALIDITY_WINDOW,
            genesis_id: params.genesis_id,
            genesis_hash,
        })
    }

    async fn submit(&self, signed: &[u8]) -> Result<String, EtfError> {
        let url = format!("{}/v2/transactions", self.base_url);
        debug!("Submitting {} transaction bytes to {}", signed.len(), url);

        let response = self
            .request(self.client()?.post(&url))
            .header(reqwest::header::CONTENT_TYPE, "application/x-binary")
            .body(signed.to_vec())
            .send()
            .await
            .map_err(|e| EtfError::Ledger {
                reason: format!("submit request error: {e}"),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EtfError::Ledger {
                reason: format!("submit rejected with HTTP {status}: {body}"),
            });
        }

        let submit: SubmitResponse = response.json().await.map_err(|e| EtfError::Ledger {
            reason: format!("failed to parse submit response: {e}"),
        })?;
        Ok(submit.tx_id)
    }

    async fn last_round(&self) -> Result<u64, EtfError> {
        let status: StatusResponse = self.get_json("/v2/status").await?;
        Ok(status.last_round)
    }

    async fn wait_for_round_after(&self, round: u64) -> Result<(), EtfError> {
        let _: StatusResponse = self
            .get_json(&format!("/v2/status/wait-for-block-after/{round}"))
            .await?;
        Ok(())
    }

    async fn pending_transaction(&self, tx_id: &str) -> Result<PendingStatus, EtfError> {
        let pending: PendingResponse = self
            .get_json(&format!("/v2/transactions/pending/{tx_id}?format=json"))
            .await?;
        Ok(PendingStatus {
            confirmed_round: pending.confirmed_round.unwrap_or(0),
            pool_error: pending.pool_error.unwrap_or_default(),
        })
    }

    async fn account_holdings(&self, address: &str) -> Result<Vec<AssetHolding>, EtfError> {
        let account: AccountResponse = self.get_json(&format!("/v2/accounts/{address}")).await?;
        Ok(account
            .assets
            .into_iter()
            .map(|a| AssetHolding {
                asset_id: a.asset_id,
                amount: a.amount,
            })
            .collect())
    }

    async fn asset_params(&self, asset_id: u64) -> Result<AssetParams, EtfError> {
        let asset: AssetResponse = self.get_json(&format!("/v2/assets/{asset_id}")).await?;
        Ok(AssetParams {
            decimals: asset.params.decimals,
            unit_name: asset.params.unit_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_bytes, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_suggested_params_snapshot() {
        let mock_server = MockServer::start().await;
        let genesis_hash = BASE64.encode([9u8; 32]);
        let mock_response = format!(
            r#"{{
                "consensus-version": "v40",
                "fee": 0,
                "min-fee": 1000,
                "genesis-hash": "{genesis_hash}",
                "genesis-id": "testnet-v1.0",
                "last-round": 5000
            }}"#
        );

        Mock::given(method("GET"))
            .and(path("/v2/transactions/params"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        let client = AlgodClient::new(&mock_server.uri(), None);
        let params = client.suggested_params().await.unwrap();

        assert_eq!(params.fee, 1000);
        assert_eq!(params.first_valid, 5000);
        assert_eq!(params.last_valid, 6000);
        assert_eq!(params.genesis_id, "testnet-v1.0");
        assert_eq!(params.genesis_hash, vec![9u8; 32]);
    }

    #[tokio::test]
    async fn test_submit_posts_raw_bytes() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/transactions"))
            .and(header("content-type", "application/x-binary"))
            .and(body_bytes(vec![1u8, 2, 3]))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"txId": "ABCDEF"}"#),
            )
            .mount(&mock_server)
            .await;

        let client = AlgodClient::new(&mock_server.uri(), None);
        let tx_id = client.submit(&[1u8, 2, 3]).await.unwrap();
        assert_eq!(tx_id, "ABCDEF");
    }

    #[tokio::test]
    async fn test_submit_rejection_carries_node_message() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/transactions"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"message": "TransactionPool.Remember: fee too low"}"#),
            )
            .mount(&mock_server)
            .await;

        let client = AlgodClient::new(&mock_server.uri(), None);
        let result = client.submit(&[1u8]).await;
        match result {
            Err(EtfError::Ledger { reason }) => {
                assert!(reason.contains("HTTP 400"));
                assert!(reason.contains("fee too low"));
            }
            other => panic!("expected Ledger error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_pending_transaction_states() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/transactions/pending/PENDINGTX"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{}"#))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/transactions/pending/CONFIRMEDTX"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"confirmed-round": 1234}"#),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/transactions/pending/REJECTEDTX"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"pool-error": "transaction already in ledger"}"#),
            )
            .mount(&mock_server)
            .await;

        let client = AlgodClient::new(&mock_server.uri(), None);

        let pending = client.pending_transaction("PENDINGTX").await.unwrap();
        assert_eq!(pending.confirmed_round, 0);
        assert!(pending.pool_error.is_empty());

        let confirmed = client.pending_transaction("CONFIRMEDTX").await.unwrap();
        assert_eq!(confirmed.confirmed_round, 1234);

        let rejected = client.pending_transaction("REJECTEDTX").await.unwrap();
        assert_eq!(rejected.pool_error, "transaction already in ledger");
    }

    #[tokio::test]
    async fn test_account_holdings_and_asset_params() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/accounts/SOMEADDRESS"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"address": "SOMEADDRESS", "assets": [{"asset-id": 14875048, "amount": 25}]}"#,
            ))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/assets/14875048"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"index": 14875048, "params": {"decimals": 0, "unit-name": "ETF"}}"#,
            ))
            .mount(&mock_server)
            .await;

        let client = AlgodClient::new(&mock_server.uri(), None);

        let holdings = client.account_holdings("SOMEADDRESS").await.unwrap();
        assert_eq!(
            holdings,
            vec![AssetHolding {
                asset_id: 14875048,
                amount: 25
            }]
        );

        let params = client.asset_params(14875048).await.unwrap();
        assert_eq!(params.decimals, 0);
        assert_eq!(params.unit_name.as_deref(), Some("ETF"));
    }
}
