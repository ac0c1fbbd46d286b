mod cli;
mod config;
mod db;
mod error;
mod ledger;
mod models;
mod notifications;
mod prayer_times;
mod stats;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;

use cli::args::{Cli, Commands};
use cli::handlers;
use config::AppConfig;
use db::Store;
use prayer_times::AladhanClient;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Loading config")?;

    AppConfig::ensure_data_dir()?;
    let db_path = AppConfig::db_path()?;
    let store = Store::open(&db_path)
        .with_context(|| format!("Opening database at {:?}", db_path))?;

    let provider = AladhanClient::new(
        &config.api.base_url,
        config.api.method,
        Duration::from_secs(config.api.timeout_secs),
    )
    .context("Building HTTP client")?;

    match cli.command {
        Commands::Times { refresh, watch } => {
            handlers::handle_times(&store, &config, &provider, refresh, watch)?;
        }
        Commands::Mark { prayer, missed, congregation } => {
            handlers::handle_mark(&store, &config, &provider, &prayer, missed, congregation)?;
        }
        Commands::Qaza { action } => {
            handlers::handle_qaza(&store, &action)?;
        }
        Commands::Schedule { today } => {
            handlers::handle_schedule(&store, &config, &provider, today)?;
        }
        Commands::Notify { action } => {
            handlers::handle_notify(&store, &config, &provider, &action)?;
        }
        Commands::Stats { week, month } => {
            handlers::handle_stats(&store, week, month)?;
        }
        Commands::Achievements => {
            handlers::handle_achievements(&store)?;
        }
    }

    store.close()?;
    Ok(())
}
