use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use pivotfx::cli::setup::setup;
use pivotfx::core::log::init_logging;

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

impl From<Commands> for pivotfx::AppCommand {
    fn from(cmd: Commands) -> pivotfx::AppCommand {
        match cmd {
            Commands::Fetch => pivotfx::AppCommand::Fetch,
            Commands::Historical { date, base } => pivotfx::AppCommand::Historical { date, base },
            Commands::Rate { base, quote, json } => pivotfx::AppCommand::Rate { base, quote, json },
            Commands::Rates => pivotfx::AppCommand::Rates,
            Commands::Watch => pivotfx::AppCommand::Watch,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch the latest pivot rates and store them
    Fetch,
    /// Show provider rates for a past date without storing them
    Historical {
        /// Business date, YYYY-MM-DD
        #[arg(short, long)]
        date: String,
        /// Base currency, defaults to the pivot
        #[arg(short, long)]
        base: Option<String>,
    },
    /// Show the rate for a currency pair from stored data
    Rate {
        base: String,
        quote: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List stored pivot rates
    Rates,
    /// Fetch at startup and then on the configured schedule
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => pivotfx::cli::setup::setup_at_path(path),
            None => setup(),
        },
        Some(cmd) => pivotfx::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
