//! Web front door: login, upload and observation listing.
//!
//! Everything behind `/` and `/upload/` requires a session; anonymous
//! requests are redirected to `/login/`. Uploaded photos are served back
//! from the configured media prefix.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
pub mod templates;

use std::net::SocketAddr;

use specimen_core::Config;

pub use router::build_router;
pub use state::AppState;

/// Multipart framing allowance on top of the file size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Serve until Ctrl+C or SIGTERM.
pub async fn run(config: &Config, state: AppState, bind: SocketAddr) -> anyhow::Result<()> {
    // Surface template errors at startup rather than on the first request.
    templates::pages()?;

    let max_body = usize::try_from(config.limits.max_file_size_mb)
        .unwrap_or(usize::MAX)
        .saturating_mul(1024 * 1024)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let app = build_router(state.clone(), max_body);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    tracing::info!(
        "Max upload: {}MB, media at {} served from {}",
        config.limits.max_file_size_mb,
        state.media_url,
        state.media.root().display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.db.close().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
