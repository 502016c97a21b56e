use anyhow::{Context, Result};
use std::sync::Arc;

use pickdraw::config::Config;
use pickdraw::server::ApiServer;

use super::build_pipeline;

/// Serve the HTTP API until Ctrl+C
pub async fn serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let pipeline = Arc::new(build_pipeline(&config).await?);
    let server = ApiServer::new(config.server.clone(), pipeline);

    println!("pickdraw API listening on http://{}", server.bind_address());
    println!();
    println!("Endpoints:");
    println!("  GET  /api/scrape?game=PICK3|PICK4 - Extract one game (no writes)");
    println!("  POST /api/retrieve                - Scrape, store and notify");
    println!("  GET  /api/health                  - Health check");
    println!("  GET  /metrics                     - Prometheus metrics");
    println!();

    server
        .start_with_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
