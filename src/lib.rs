pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

// Re-export for main.rs and integration tests
pub use crate::core::config;

use crate::core::appraisal::AppraisalProvider;
use crate::core::config::AppConfig;
use crate::core::freight::FreightProvider;
use crate::providers::{
    CachingAppraisalProvider, CachingFreightProvider, JaniceProvider, PushXProvider,
};
use crate::store::DataStore;
use crate::store::ledger::LedgerStore;
use anyhow::{Context, Result, bail};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub enum AppCommand {
    Watch,
    Report,
    Prices,
    Add {
        price: Decimal,
        appraisal_id: String,
    },
    Sell {
        commodity_type: String,
        amount: Decimal,
        proceeds: Decimal,
    },
}

/// Wired application: the ledger plus cached live providers.
pub struct App {
    pub config: AppConfig,
    pub ledger: LedgerStore,
    pub appraisals: Box<dyn AppraisalProvider>,
    pub freight: Box<dyn FreightProvider>,
}

impl App {
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let data_path = config.default_data_path()?;
        debug!("Using data directory {}", data_path.display());
        let store = DataStore::new(data_path);

        let janice_config = config.providers.janice.clone().unwrap_or_default();
        let pushx_config = config.providers.pushx.clone().unwrap_or_default();

        let janice = JaniceProvider::new(&janice_config, &config.watched_ores)
            .context("Failed to create Janice client")?;
        let appraisals = CachingAppraisalProvider::new(
            janice,
            Arc::new(store.appraisals()),
            Arc::new(store.ore_prices()),
        );

        let pushx = PushXProvider::new(&pushx_config).context("Failed to create PushX client")?;
        let freight = CachingFreightProvider::new(pushx, Arc::new(store.freight_quotes()));

        Ok(Self {
            ledger: store.ledger(),
            appraisals: Box::new(appraisals),
            freight: Box::new(freight),
            config,
        })
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("EVE Profits starting...");

    let config = AppConfig::load(config_path)?;
    debug!("Loaded config: {config:#?}");
    let app = App::from_config(config)?;

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    run_app(&app, command, &cancel).await
}

/// Runs `command`, giving up on it once `cancel` fires.
///
/// Only the freight client and the watch loop observe the token themselves.
/// Any other pending work, such as a stalled Janice request, is dropped and
/// the command fails as interrupted.
pub async fn run_app(app: &App, command: AppCommand, cancel: &CancellationToken) -> Result<()> {
    let work = async {
        match command {
            AppCommand::Watch => cli::watch::run(app, cancel).await,
            AppCommand::Report => cli::report::run(app, cancel).await,
            AppCommand::Prices => cli::prices::run(app).await,
            AppCommand::Add {
                price,
                appraisal_id,
            } => cli::record::add(app, price, &appraisal_id).await,
            AppCommand::Sell {
                commodity_type,
                amount,
                proceeds,
            } => cli::record::sell(app, &commodity_type, amount, proceeds).await,
        }
    };

    // The command goes first so a watch loop that already saw the token ends cleanly
    tokio::select! {
        biased;
        result = work => result,
        _ = cancel.cancelled() => bail!("Interrupted"),
    }
}
