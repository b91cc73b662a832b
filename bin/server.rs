// Account Service - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use tower_http::trace::TraceLayer;
use tracing::info;

use account_service::{build_router, init_logging, AppState, Database, ServerConfig, VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env()?;
    init_logging(config.log_format);

    info!(version = VERSION, "Account Service - Web Server");

    // Open database
    let db = Database::open(&config.database_path)
        .with_context(|| format!("failed to open database at {}", config.database_path))?;
    info!(path = %config.database_path, "database opened");

    let app = build_router(AppState { db })?.layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    info!(%addr, "server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
