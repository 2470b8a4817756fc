use std::sync::Arc;
use tracing::info;

use crate::app::{build_router, connect_backend, AppContext};
use crate::config::AppConfig;
use crate::realtime::SocketHub;

pub async fn handle(config: &AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    info!("Starting back office API in {:?} mode", config.environment);
    #[cfg(feature = "dev-bypass")]
    if config.is_development() {
        tracing::warn!("Built with dev-bypass: any verified subject is treated as admin");
    }

    let backend = connect_backend(config).await?;
    let ctx = AppContext::from_config(config, &backend)?;
    let hub = config.realtime.enabled.then(|| Arc::new(SocketHub::new()));
    let app = build_router(ctx, &backend, hub, &config.server.cors_origins);

    let port = port.unwrap_or(config.server.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    info!("Back office API listening on http://{} ({} store)", bind_addr, backend.name());
    axum::serve(listener, app).await?;
    Ok(())
}
