//! Marketplace HTTP server.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin marketplace-server
//!
//! # Protect write routes
//! ADMIN_TOKEN=s3cret PORT=3000 cargo run --bin marketplace-server
//! ```
//!
//! # Environment Variables
//!
//! - `MARKETPLACE_CONFIG`: path to a TOML config file (default: `marketplace.toml` if present)
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `ADMIN_TOKEN`: bearer token required by write routes (default: none, routes open)
//! - `REPOSITORY_TYPE`: repository backend (default: local)
//! - `RUST_LOG`: Log level (default: info)

use std::env;

use tokio::signal;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use marketplace::config::AppConfig;
use marketplace::db::RepositoryFactory;
use marketplace::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting marketplace server");

    let config = AppConfig::load()?;
    let repository = RepositoryFactory::from_config(&config)?;
    info!("Repository initialized ({:?})", config.repository_type()?);

    if config.server.admin_token.is_none() {
        warn!("ADMIN_TOKEN is not set; write routes are unauthenticated");
    }

    let state = AppState::from_config(repository, &config);
    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", listener.local_addr()?);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
