use std::fs;
use tracing::info;

// Adds automatic logging to tests
mod test_utils {
    use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Market-data server answering every basket slug with the same
    /// statistics body.
    pub async fn create_market_mock_server(mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data-api/v3/cryptocurrency/detail"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    /// Algod node serving a fixed suggested-params snapshot.
    pub async fn create_algod_mock_server() -> MockServer {
        let mock_server = MockServer::start().await;
        let genesis_hash = BASE64.encode([9u8; 32]);
        let params_response = format!(
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
            .respond_with(ResponseTemplate::new(200).set_body_string(params_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub const STATS_BODY: &str = r#"{
        "data": {
            "statistics": {
                "marketCap": 300.0,
                "circulatingSupply": 40.0,
                "price": 0.25
            }
        }
    }"#;
}

#[test_log::test(tokio::test)]
async fn test_full_price_flow_with_mock() {
    let mock_server = test_utils::create_market_mock_server(test_utils::STATS_BODY).await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_content = format!(
        r#"
fund:
  address: "MXIGC5RCUFNFV2TB7ODAGQ4H7VC75DCH2SBBG7ATWPLB4YHBO7FFPNVLJ4"
  asset_id: 14875048
market_data:
  base_url: {}
"#,
        mock_server.uri()
    );
    fs::write(config_file.path(), &config_content).expect("Failed to write config file");

    let result = algoetf::run_command(
        algoetf::AppCommand::Price {
            weighting: "market-cap".to_string(),
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Price command failed with: {:?}",
        result.err()
    );

    // Equal weighting runs off the same payloads.
    let result = algoetf::run_command(
        algoetf::AppCommand::Price {
            weighting: "equal".to_string(),
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(result.is_ok());
}

#[test_log::test(tokio::test)]
async fn test_buy_without_credentials_persists_unsigned_legs() {
    use algoetf::core::txn::Address;

    let market_server = test_utils::create_market_mock_server(test_utils::STATS_BODY).await;
    let algod_server = test_utils::create_algod_mock_server().await;

    let work_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let fund_address = Address([3u8; 32]).encode();
    let account_address = Address([4u8; 32]).encode();

    // Watch-only account, no fund operator: both legs stay unsigned.
    let credentials_path = work_dir.path().join("credentials.yaml");
    fs::write(
        &credentials_path,
        format!(
            r#"
accounts:
  - name: "primary"
    address: "{account_address}"
"#
        ),
    )
    .expect("Failed to write credentials file");

    let config_path = work_dir.path().join("config.yaml");
    let config_content = format!(
        r#"
fund:
  address: "{fund_address}"
  asset_id: 14875048
algod:
  base_url: {}
market_data:
  base_url: {}
credentials_file: {}
artifact_dir: {}
"#,
        algod_server.uri(),
        market_server.uri(),
        credentials_path.display(),
        work_dir.path().display(),
    );
    fs::write(&config_path, &config_content).expect("Failed to write config file");

    let result = algoetf::run_command(
        algoetf::AppCommand::Buy {
            units: 2,
            account: Some("primary".to_string()),
            weighting: "market-cap".to_string(),
        },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(result.is_ok(), "Buy command failed with: {:?}", result.err());

    let transfer_artifact = work_dir.path().join("transfer.txn");
    let settlement_artifact = work_dir.path().join("settlement.txn");
    assert!(transfer_artifact.exists(), "token leg artifact missing");
    assert!(settlement_artifact.exists(), "settlement leg artifact missing");

    info!(
        "Unsigned artifacts written: {} and {}",
        transfer_artifact.display(),
        settlement_artifact.display()
    );
    let transfer_bytes = fs::read(&transfer_artifact).unwrap();
    let settlement_bytes = fs::read(&settlement_artifact).unwrap();
    assert!(!transfer_bytes.is_empty());
    assert!(!settlement_bytes.is_empty());
    assert_ne!(transfer_bytes, settlement_bytes);
}

#[test_log::test(tokio::test)]
async fn test_buy_with_unknown_account_fails() {
    let market_server = test_utils::create_market_mock_server(test_utils::STATS_BODY).await;

    let work_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = work_dir.path().join("config.yaml");
    let config_content = format!(
        r#"
fund:
  address: "MXIGC5RCUFNFV2TB7ODAGQ4H7VC75DCH2SBBG7ATWPLB4YHBO7FFPNVLJ4"
  asset_id: 14875048
market_data:
  base_url: {}
credentials_file: {}
"#,
        market_server.uri(),
        work_dir.path().join("credentials.yaml").display(),
    );
    fs::write(&config_path, &config_content).expect("Failed to write config file");

    let result = algoetf::run_command(
        algoetf::AppCommand::Buy {
            units: 1,
            account: Some("nobody".to_string()),
            weighting: "market-cap".to_string(),
        },
        Some(config_path.to_str().unwrap()),
    )
    .await;

    let error = result.expect_err("buy with unknown account must fail");
    assert!(
        error.to_string().contains("nobody"),
        "unexpected error: {error}"
    );
}

#[test_log::test(tokio::test)]
async fn test_holdings_flow_with_mock() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    let algod_server = test_utils::create_algod_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/v2/accounts/USERADDR"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"address": "USERADDR", "assets": [{"asset-id": 14875048, "amount": 25}]}"#,
        ))
        .mount(&algod_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/assets/14875048"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"index": 14875048, "params": {"decimals": 0, "unit-name": "ETF"}}"#,
        ))
        .mount(&algod_server)
        .await;

    let work_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let credentials_path = work_dir.path().join("credentials.yaml");
    fs::write(
        &credentials_path,
        r#"
accounts:
  - name: "primary"
    address: "USERADDR"
"#,
    )
    .expect("Failed to write credentials file");

    let config_path = work_dir.path().join("config.yaml");
    let config_content = format!(
        r#"
fund:
  address: "MXIGC5RCUFNFV2TB7ODAGQ4H7VC75DCH2SBBG7ATWPLB4YHBO7FFPNVLJ4"
  asset_id: 14875048
algod:
  base_url: {}
credentials_file: {}
default_account: "primary"
"#,
        algod_server.uri(),
        credentials_path.display(),
    );
    fs::write(&config_path, &config_content).expect("Failed to write config file");

    let result = algoetf::run_command(
        algoetf::AppCommand::Holdings { account: None },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Holdings command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_history_flow_with_mock() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let indexer_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{
                "transactions": [
                    {
                        "sender": "FUNDADDR",
                        "fee": 1000,
                        "confirmed-round": 900,
                        "asset-transfer-transaction": {"amount": 5, "receiver": "USERADDR"}
                    }
                ]
            }"#,
        ))
        .mount(&indexer_server)
        .await;

    let work_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let credentials_path = work_dir.path().join("credentials.yaml");
    fs::write(
        &credentials_path,
        r#"
accounts:
  - name: "primary"
    address: "USERADDR"
"#,
    )
    .expect("Failed to write credentials file");

    let config_path = work_dir.path().join("config.yaml");
    let config_content = format!(
        r#"
fund:
  address: "MXIGC5RCUFNFV2TB7ODAGQ4H7VC75DCH2SBBG7ATWPLB4YHBO7FFPNVLJ4"
  asset_id: 14875048
indexer:
  base_url: {}
credentials_file: {}
default_account: "primary"
"#,
        indexer_server.uri(),
        credentials_path.display(),
    );
    fs::write(&config_path, &config_content).expect("Failed to write config file");

    let result = algoetf::run_command(
        algoetf::AppCommand::History { account: None },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "History command failed with: {:?}",
        result.err()
    );
}
