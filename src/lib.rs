pub mod cli;
pub mod config;
pub mod core;
pub mod credentials;
pub mod providers;

use crate::config::AppConfig;
use crate::core::coin::Basket;
use crate::core::compose::{Composer, ConfirmationPolicy, IntentKind, TradeParty};
use crate::core::nav::WeightingStrategy;
use crate::credentials::{Account, CredentialStore};
use crate::providers::algod::AlgodClient;
use crate::providers::coinmarketcap::CoinMarketCapProvider;
use crate::providers::indexer::IndexerClient;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum AppCommand {
    Price {
        weighting: String,
    },
    Buy {
        units: u64,
        account: Option<String>,
        weighting: String,
    },
    Sell {
        units: u64,
        account: Option<String>,
        weighting: String,
    },
    Holdings {
        account: Option<String>,
    },
    History {
        account: Option<String>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("AlgoETF starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let market = CoinMarketCapProvider::new(&config.market_data.base_url);

    match command {
        AppCommand::Price { weighting } => {
            let strategy: WeightingStrategy = weighting.parse()?;
            cli::price::run(&market, strategy).await
        }
        AppCommand::Buy {
            units,
            account,
            weighting,
        } => trade(&config, &market, IntentKind::Buy, units, account, &weighting).await,
        AppCommand::Sell {
            units,
            account,
            weighting,
        } => trade(&config, &market, IntentKind::Sell, units, account, &weighting).await,
        AppCommand::Holdings { account } => {
            let ledger = AlgodClient::new(&config.algod.base_url, config.algod.token.as_deref());
            let account = resolve_account(&config, account)?;
            cli::holdings::run(&ledger, config.fund.asset_id, &account).await
        }
        AppCommand::History { account } => {
            let indexer = IndexerClient::new(&config.indexer.base_url);
            let account = resolve_account(&config, account)?;
            cli::history::run(&indexer, config.fund.asset_id, &account.address).await
        }
    }
}

async fn trade(
    config: &AppConfig,
    market: &CoinMarketCapProvider,
    kind: IntentKind,
    units: u64,
    account: Option<String>,
    weighting: &str,
) -> Result<()> {
    let strategy: WeightingStrategy = weighting.parse()?;
    let store = load_credentials(config)?;
    let user = resolve_from(&store, config, account)?;

    // Fund-side credentials come from the named operator account; a missing
    // or watch-only operator leaves the fund's legs unsigned.
    let fund_credentials = match &config.fund.operator_account {
        Some(operator) => store.resolve(operator)?.credentials,
        None => None,
    };
    let fund = TradeParty {
        address: config.fund.address.clone(),
        credentials: fund_credentials,
    };
    let account_party = TradeParty {
        address: user.address.clone(),
        credentials: user.credentials.clone(),
    };

    let ledger = AlgodClient::new(&config.algod.base_url, config.algod.token.as_deref());
    let basket = Basket::proof_of_stake();
    let composer = Composer {
        market,
        rates: market,
        ledger: &ledger,
        basket: &basket,
        asset_id: config.fund.asset_id,
        strategy,
        confirmation: ConfirmationPolicy::bounded(config.confirmation_rounds),
        artifact_dir: config
            .artifact_dir
            .as_deref()
            .map_or_else(|| PathBuf::from("."), PathBuf::from),
    };

    cli::trade::run(&composer, kind, fund, account_party, units).await
}

fn load_credentials(config: &AppConfig) -> Result<CredentialStore> {
    let path = match &config.credentials_file {
        Some(path) => PathBuf::from(path),
        None => CredentialStore::default_path()?,
    };
    CredentialStore::load_from_path(path)
}

fn resolve_account(config: &AppConfig, account: Option<String>) -> Result<Account> {
    let store = load_credentials(config)?;
    resolve_from(&store, config, account)
}

/// Account selection is an explicit parameter with the config default as
/// fallback; no ambient process state is consulted.
fn resolve_from(
    store: &CredentialStore,
    config: &AppConfig,
    account: Option<String>,
) -> Result<Account> {
    let name = account
        .or_else(|| config.default_account.clone())
        .context("No account selected; pass --account or set default_account in the config")?;
    Ok(store.resolve(&name)?)
}
