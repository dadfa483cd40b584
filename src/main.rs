use anyhow::{Context, Result};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tracelink::app::{create_app, Services};
use tracelink::config::{Config, RedirectMode};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    if config.link_prefix.is_empty() {
        info!("LINK_PREFIX is not set; issued links will be relative paths");
    }

    let services = Services::from_config(&config)?;
    let app = create_app(&services, &config.link_prefix, config.redirect_mode);

    match config.redirect_mode {
        RedirectMode::Decoy => info!("↪️  /t/{{id}} captures and redirects to the decoy URL"),
        RedirectMode::TrackingPage => info!(
            "↪️  /t/{{id}} redirects to the tracking page at {}/track/{{id}}",
            config.link_prefix
        ),
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("🚀 Server listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
