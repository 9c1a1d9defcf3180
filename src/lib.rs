pub mod app;
pub mod cli;
pub mod core;
pub mod providers;
pub mod store;
pub mod trading;

use crate::core::config::AppConfig;
use crate::core::model::{AccountId, TradeKind};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::{debug, info};

pub enum AppCommand {
    Price,
    Open,
    Balance,
    Trade { kind: TradeKind, amount: Decimal },
    History { page: usize },
}

pub async fn run_command(
    command: AppCommand,
    user: Option<&AccountId>,
    config_path: Option<&str>,
) -> Result<()> {
    info!("Aurum starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(data_path = ?config.data_path, "Loaded config");

    let app = app::App::open(&config).await?;
    let result = dispatch(&app, command, user).await;

    // Flush even when the command failed
    app.shutdown().context("Failed to close storage")?;
    result
}

async fn dispatch(app: &app::App, command: AppCommand, user: Option<&AccountId>) -> Result<()> {
    // Every command acts on behalf of a principal, even read-only ones
    let user = user.context("This command needs an account, pass one with --user")?;
    match command {
        AppCommand::Price => cli::price::run(app).await,
        AppCommand::Open => cli::account::open(app, user).await,
        AppCommand::Balance => cli::account::balance(app, user).await,
        AppCommand::Trade { kind, amount } => cli::trade::run(app, user, kind, amount).await,
        AppCommand::History { page } => cli::history::run(app, user, page).await,
    }
}
