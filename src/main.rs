mod cli;
mod config;
mod daemon;
mod db;
mod engine;
mod error;
#[cfg(test)]
mod fakes;
mod models;
mod notify;
mod prayer_times;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;

use cli::args::{Cli, Commands, SettingsCommands};
use cli::handlers;
use config::AppConfig;
use db::migrations::run_migrations;
use db::SqliteSettingsStore;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Loading config")?;
    write_default_config(&config);

    // Ensure data directory exists and open DB
    AppConfig::ensure_data_dir()?;
    let db_path = AppConfig::db_path()?;
    let conn = Connection::open(&db_path)
        .with_context(|| format!("Opening database at {:?}", db_path))?;

    // The daemon reads settings while the CLI writes them
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    // Run migrations on every startup
    run_migrations(&conn)?;

    run_command(cli.command.unwrap_or(Commands::Status), conn, &config)
}

fn run_command(command: Commands, conn: Connection, config: &AppConfig) -> Result<()> {
    match command {
        Commands::Daemon => daemon::run(conn, config),
        Commands::Times { date } => {
            handlers::handle_times(&SqliteSettingsStore::new(conn), config, date)
        }
        Commands::Status => handlers::handle_status(config),
        Commands::Refresh => handlers::handle_refresh(config),
        Commands::Hijri { date } => handlers::handle_hijri(&SqliteSettingsStore::new(conn), date),
        Commands::Settings { action } => {
            let mut store = SqliteSettingsStore::new(conn);
            match action {
                SettingsCommands::Show => handlers::handle_settings_show(&store),
                SettingsCommands::Set(args) => {
                    handlers::handle_settings_set(&mut store, config, &args)
                }
            }
        }
    }
}

/// First run: leave a config.toml with the defaults in place so it can be edited.
fn write_default_config(config: &AppConfig) {
    match AppConfig::config_path() {
        Ok(path) if !path.exists() => match config.save_to_path(&path) {
            Ok(()) => log::info!("Wrote default config to {:?}", path),
            Err(e) => log::warn!("Could not write default config: {:#}", e),
        },
        _ => {}
    }
}
