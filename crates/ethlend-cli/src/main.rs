//! Ethlend command-line dashboard
//!
//! Connects to the wallet, loads the price and the loan list once, then runs
//! one action against the lending contract.

mod render;

use std::sync::Arc;

use alloy_primitives::Address;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ethlend_client::{
    Contracts, EthlendConfig, InMemoryLedger, JsonRpcWallet, LendingController, UnlockedWallet,
    WalletConnector, WalletProvider,
};
use ethlend_common::VERSION;

use crate::render::ConsoleNotifier;

/// Price quoted by the simulated oracle: 2000 USD, 8 decimals
const SIMULATED_PRICE: u128 = 200_000_000_000;

#[derive(Debug, Parser)]
#[command(name = "ethlend", version, about = "ETH-collateralized USDT lending dashboard")]
struct Cli {
    /// Configuration file (defaults to ./ethlend.toml when present)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Wallet JSON-RPC endpoint, overrides the configuration
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Run against an in-memory ledger instead of a wallet. The ledger
    /// starts empty on every invocation, so loans do not carry over.
    #[arg(long, global = true)]
    simulate: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show price, loans and warnings
    Status,
    /// Show the collateral required to borrow an amount
    Quote {
        /// USDT amount to borrow
        amount: String,
    },
    /// Take a loan
    Borrow {
        /// USDT amount to borrow
        amount: String,
        /// ETH collateral to lock; defaults to the required amount
        #[arg(long)]
        collateral: Option<String>,
    },
    /// Repay a loan in full
    Repay {
        /// Loan number as shown by `status`
        number: usize,
    },
}

/// Where ledger calls go
enum Backend {
    Wallet(Arc<JsonRpcWallet>),
    Simulated(InMemoryLedger),
}

impl Backend {
    fn provider(&self) -> Arc<dyn WalletProvider> {
        match self {
            Backend::Wallet(wallet) => wallet.clone(),
            Backend::Simulated(ledger) => Arc::new(UnlockedWallet::single(ledger.account())),
        }
    }

    fn contracts(&self, account: Address, config: &EthlendConfig) -> Contracts {
        match self {
            Backend::Wallet(wallet) => Contracts::bind_evm(
                wallet.clone(),
                account,
                config.contracts.lending,
                config.contracts.usdt,
                config.confirmation_policy(),
            ),
            Backend::Simulated(ledger) => ledger.as_account(account).contracts(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    info!("Starting Ethlend v{}", VERSION);

    // Load configuration
    let mut config = EthlendConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.rpc_url {
        config.rpc.url = url;
    }
    debug!(?config, "Loaded configuration");

    let backend = if cli.simulate {
        info!("Using simulated ledger");
        Backend::Simulated(InMemoryLedger::new(Address::repeat_byte(0x5a), SIMULATED_PRICE))
    } else {
        info!(url = %config.rpc.url, "Using wallet endpoint");
        Backend::Wallet(Arc::new(JsonRpcWallet::new(
            config.rpc.url.clone(),
            config.request_timeout(),
        )?))
    };

    let notifier = Arc::new(ConsoleNotifier);
    let controller = LendingController::new(config.protocol.clone(), notifier.clone());
    let connector = WalletConnector::new(Some(backend.provider()), notifier);

    let dashboard = &controller;
    let (backend_ref, config_ref) = (&backend, &config);
    let session = connector
        .connect_with(|session| async move {
            let contracts = backend_ref.contracts(session.address, config_ref);
            dashboard.on_wallet_connect(&session, contracts).await
        })
        .await
        .context("wallet connection failed")?;
    if session.is_none() {
        bail!("no wallet reachable at {}", config.rpc.url);
    }
    let address = connector.display_address();

    match cli.command {
        Command::Status => {
            render::status(&controller, address.as_deref());
        }
        Command::Quote { amount } => {
            controller.set_usdt_amount(amount.as_str());
            render::quote(&amount, controller.eth_collateral());
        }
        Command::Borrow { amount, collateral } => {
            controller.set_usdt_amount(amount.as_str());
            match collateral {
                Some(collateral) => controller.take_loan(amount.trim(), collateral.trim()).await?,
                None => controller.take_loan_from_inputs().await?,
            };
            render::loans(&controller);
        }
        Command::Repay { number } => {
            let Some(index) = number.checked_sub(1) else {
                bail!("loan numbers start at 1");
            };
            let outcome = controller.repay_loan(index).await?;
            render::repay_outcome(number, outcome);
            render::loans(&controller);
        }
    }

    Ok(())
}
