//! Survey Admin - spreadsheet import, volunteer assignment and export
//!
//! Imports a respondent spreadsheet, splits it into per-volunteer batches,
//! tracks which records have been updated and exports them again.

mod cli;
mod config;
mod db;
mod defaults;
mod handlers;
mod services;
mod types;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Logs directory - use LOGS_DIR env var or default to ./logs
    let logs_dir = std::env::var("LOGS_DIR").unwrap_or_else(|_| "./logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "survey-admin.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // stdout carries command output, so console logs go to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn,survey_admin=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    let config = config::Config::from_env()?;
    debug!("Configuration loaded: {:?}", config);

    if let Err(e) = handlers::dispatch(cli.command, &config).await {
        error!("Command failed: {:#}", e);
        return Err(e);
    }

    Ok(())
}
