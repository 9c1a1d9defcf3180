use anyhow::Result;
use aurum::core::log::init_logging;
use aurum::core::model::{AccountId, TradeKind};
use clap::{CommandFactory, Parser, Subcommand};
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

    /// Account to act on
    #[arg(short, long, global = true)]
    user: Option<AccountId>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for aurum::AppCommand {
    fn from(cmd: Commands) -> aurum::AppCommand {
        match cmd {
            Commands::Price => aurum::AppCommand::Price,
            Commands::Open => aurum::AppCommand::Open,
            Commands::Balance => aurum::AppCommand::Balance,
            Commands::Trade { kind, amount } => aurum::AppCommand::Trade { kind, amount },
            Commands::History { page } => aurum::AppCommand::History { page },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the current gold price
    Price,
    /// Open an account with the starting balance
    Open,
    /// Display account balance
    Balance,
    /// Buy or sell gold, in grams
    Trade {
        /// BUY or SELL
        kind: TradeKind,
        amount: Decimal,
    },
    /// Display transaction history, most recent first
    History {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => aurum::cli::setup::setup(),
        Some(cmd) => {
            aurum::run_command(cmd.into(), cli.user.as_ref(), cli.config_path.as_deref()).await
        }
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
