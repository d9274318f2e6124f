mod app;
mod commands;

use std::{
    fs::{self, OpenOptions},
    path::Path,
    sync::Mutex,
};

use anyhow::{Context, Result};
use clap::Parser;
use marketplace_core::{
    config::{self, AppConfig},
    ApiClient, CartStore, SessionStore,
};
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    config::ensure_default_config()?;
    let mut config = AppConfig::load()?;
    if let Some(url) = cli.backend_url.as_deref() {
        config.backend_url = url.trim_end_matches('/').to_string();
    }
    init_logging(&config.log_dir())?;

    let storage = config.storage();
    if !storage.is_persistent() {
        tracing::info!("persistence disabled; session and cart live in memory only");
    }
    let session = SessionStore::restore(storage.clone());
    let cart = CartStore::load(storage);
    let api = ApiClient::from_config(&config);

    let mut app = app::MarketplaceApp::new(api, session, cart);
    app.run(cli.command).await
}

fn init_logging(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;
    let log_path = log_dir.join("marketplace.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
