//! The `specimen serve` command.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Args;
use specimen_core::Config;

use crate::server::{self, AppState};

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides `server.bind`)
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,
}

pub async fn execute(args: ServeArgs, config: Config) -> anyhow::Result<()> {
    let bind = match args.bind {
        Some(addr) => addr,
        None => config.server.bind.parse().map_err(|e| {
            anyhow::anyhow!("Invalid server.bind '{}': {e}", config.server.bind)
        })?,
    };

    let db = super::open_database(&config).await?;
    tracing::info!("Observation database at {}", config.database_path().display());

    let classifier = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || super::load_classifier(&config)).await??
    };
    tracing::info!(
        "Classifier ready: {} species, model {}",
        classifier.labels().len(),
        classifier.model_name()
    );

    let state = AppState::new(&config, Arc::new(classifier), db);
    server::run(&config, state, bind).await
}
