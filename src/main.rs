use std::{net::SocketAddr, sync::Arc};

use infra_portal::{
    config::Config, host::SystemClipboard, routes::AppState, session::Session,
    upstream::DecisionClient,
};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let client = DecisionClient::new(config.upstream_url.clone());
    tracing::info!("Using decision service at {}", client.base_url());

    let session = Session::new(Arc::new(client));
    tracing::info!(session = %session.id(), "Session created");
    let state = AppState { session, clipboard: Arc::new(SystemClipboard) };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Starting portal");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, infra_portal::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Portal stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Could not listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
