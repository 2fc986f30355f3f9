use algoetf::core::log::init_logging;
use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for algoetf::AppCommand {
    fn from(cmd: Commands) -> algoetf::AppCommand {
        match cmd {
            Commands::Price { weighting } => algoetf::AppCommand::Price { weighting },
            Commands::Buy {
                units,
                account,
                weighting,
            } => algoetf::AppCommand::Buy {
                units,
                account,
                weighting,
            },
            Commands::Sell {
                units,
                account,
                weighting,
            } => algoetf::AppCommand::Sell {
                units,
                account,
                weighting,
            },
            Commands::Holdings { account } => algoetf::AppCommand::Holdings { account },
            Commands::History { account } => algoetf::AppCommand::History { account },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the current index price and basket statistics
    Price {
        /// Weighting strategy: market-cap or equal
        #[arg(long, default_value = "market-cap")]
        weighting: String,
    },
    /// Buy index tokens from the fund pool
    Buy {
        /// Number of index units
        units: u64,
        /// Account name from the credentials file
        #[arg(short, long)]
        account: Option<String>,
        /// Weighting strategy: market-cap or equal
        #[arg(long, default_value = "market-cap")]
        weighting: String,
    },
    /// Sell index tokens back to the fund pool
    Sell {
        /// Number of index units
        units: u64,
        /// Account name from the credentials file
        #[arg(short, long)]
        account: Option<String>,
        /// Weighting strategy: market-cap or equal
        #[arg(long, default_value = "market-cap")]
        weighting: String,
    },
    /// Display index token holdings for an account
    Holdings {
        /// Account name from the credentials file
        #[arg(short, long)]
        account: Option<String>,
    },
    /// Display index token transfer history for an account
    History {
        /// Account name from the credentials file
        #[arg(short, long)]
        account: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => algoetf::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = algoetf::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
fund:
  address: "MXIGC5RCUFNFV2TB7ODAGQ4H7VC75DCH2SBBG7ATWPLB4YHBO7FFPNVLJ4"
  asset_id: 14875048

algod:
  base_url: "https://testnet-api.algonode.cloud"

indexer:
  base_url: "https://testnet-idx.algonode.cloud"

market_data:
  base_url: "https://api.coinmarketcap.com"
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
