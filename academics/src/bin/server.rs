//! Academics Server
//!
//! Runs the eligibility orchestrator behind its HTTP API.
//!
//! This binary:
//! - Loads `.env` and configuration from the environment
//! - Initializes tracing and the Prometheus exporter
//! - Builds the record store (`PostgreSQL` when `DATABASE_URL` is set)
//! - Serves the router until Ctrl+C or SIGTERM
//! - Drains in-flight transactions before exiting
//!
//! # Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/academics cargo run --bin academics-server
//! ```

use academics::{AcademicsApp, Config, metrics};
use anyhow::Context;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,academics=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting academics server...");

    let config = Config::from_env();
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        database = config.postgres.is_some(),
        finance = %config.remote.finance_url,
        student = %config.remote.student_url,
        library = %config.remote.library_url,
        "Configuration loaded"
    );

    let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.server.metrics_port));
    metrics::install_exporter(metrics_addr).context("failed to install metrics exporter")?;
    metrics::register_business_metrics();

    let app = AcademicsApp::new(config.clone()).await?;
    tracing::info!("✓ Application initialized");

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!(%address, "HTTP server listening");

    axum::serve(listener, app.router())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped, draining in-flight transactions...");
    let timeout = Duration::from_secs(config.server.shutdown_timeout);
    if let Err(error) = app.orchestrator.shutdown(timeout).await {
        tracing::warn!(%error, "Shutdown did not complete cleanly");
    }

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }
}
