use anyhow::Result;
use clap::{Parser, Subcommand};
use eveprofits::AppCommand;
use eveprofits::core::log::init_logging;
use rust_decimal::Decimal;

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

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show the profit report and record buybacks typed on the console (default)
    Watch,
    /// Print the profit report once
    Report,
    /// Print current prices of the watched ores
    Prices,
    /// Record a buyback
    Add {
        /// ISK paid for the lot
        price: Decimal,
        /// Janice appraisal code of the lot
        appraisal_id: String,
    },
    /// Record a sale of held stock
    Sell {
        /// Ore name as it appears in the report
        commodity_type: String,
        /// Volume sold in m3, the unit of the report's volume column
        amount: Decimal,
        /// ISK received
        proceeds: Decimal,
    },
}

impl From<Commands> for AppCommand {
    fn from(cmd: Commands) -> AppCommand {
        match cmd {
            Commands::Watch => AppCommand::Watch,
            Commands::Report => AppCommand::Report,
            Commands::Prices => AppCommand::Prices,
            Commands::Add {
                price,
                appraisal_id,
            } => AppCommand::Add {
                price,
                appraisal_id,
            },
            Commands::Sell {
                commodity_type,
                amount,
                proceeds,
            } => AppCommand::Sell {
                commodity_type,
                amount,
                proceeds,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => eveprofits::cli::setup::setup(),
        Some(cmd) => eveprofits::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => eveprofits::run_command(AppCommand::Watch, cli.config_path.as_deref()).await,
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
