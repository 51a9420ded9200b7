//! Local run mode.
//!
//! Serves both deployed functions behind one listener on `app_port`:
//! `/api/inngest` goes to the jobs entrypoint, every other path to the
//! health entrypoint. Each request still builds, starts and stops its own
//! composition root.

use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::TcpListener;

use ephemeral_app::app;
use ephemeral_app::config::ConfigLoader;
use ephemeral_app::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::from_env().load()?;
    logging::init(&config);

    tracing::info!(
        app = %config.app_name,
        env = %config.app_env,
        port = config.app_port,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.app_port))).await?;
    app::serve(listener, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
