// Server module - binds the listener and serves the configured pipeline

use std::net::SocketAddr;

use crate::infrastructure::config::Config;
use crate::infrastructure::startup::{Startup, StartupError};

/// Registers services, assembles the pipeline and serves until ctrl-c
pub async fn run(config: Config) -> Result<(), StartupError> {
    let startup = Startup::new(config);
    let state = startup.configure_services().await?;
    let app = startup.configure(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], startup.config().port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
