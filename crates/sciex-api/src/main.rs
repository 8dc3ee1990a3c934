//! SCIEX API Server
//!
//! REST API server for scientific entity extraction from PDF documents.
//!
//! Author: hephaex@gmail.com

use sciex_api::{create_router, state::AppState};
use sciex_core::config::{AppConfig, LoggingConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match std::env::var("SCIEX_CONFIG") {
        Ok(path) => AppConfig::from_file(path)?.with_env_override()?,
        Err(_) => AppConfig::from_env()?,
    };

    // Initialize tracing
    init_tracing(&config.logging);

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Create application state; the NER model is loaded once here
    let state = Arc::new(AppState::from_config(config)?);
    tracing::info!("Upload directory: {}", state.uploads.dir().display());

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("SCIEX API Server starting on http://{}", addr);
    tracing::info!("OpenAPI spec at http://{}/openapi.yaml", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("SCIEX API Server stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let level = &logging.level;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("sciex_api={level},sciex_parser={level},sciex_extractor={level},tower_http=debug")
            .into()
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(logging.include_location)
        .with_line_number(logging.include_location);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
