#![forbid(unsafe_code)]

use std::sync::Arc;

use portal_adapter::telemetry::init_tracing;
use portal_adapter::{serve, PortalConfig, PortalRuntime};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = PortalConfig::from_env()?;
    init_tracing(&config.log_filter, config.log_format)?;

    let runtime = Arc::new(PortalRuntime::from_config(&config)?);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(
        bind = %config.bind,
        data_path = %config.data_path.display(),
        credential_backend = runtime.credential_backend(),
        session_lifetime_secs = runtime.session_lifetime_secs(),
        "portal_http listening"
    );
    serve(listener, runtime, shutdown_signal()).await?;
    tracing::info!("portal_http stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "ctrl-c handler unavailable, running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
