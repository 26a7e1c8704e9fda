//! modelres HTTP server
//!
//! Serves the configured resources over REST.

use anyhow::Result;
use modelres_server::{
    create_router, default_interceptors, AppState, LogFormat, ResourceRegistry, ServerConfig,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = ServerConfig::load()?;

    // Initialize tracing
    init_tracing(&config.log_level, config.log_format)?;
    info!("Loaded configuration: {:?}", config);

    let registry = ResourceRegistry::from_config(&config).await?;
    info!("Registered {} resource(s)", registry.len());

    let state = AppState::new(registry, default_interceptors(&config));
    let app = create_router(state);

    // Start server
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    info!("  Health check: http://{}/health", addr);
    for entry in &config.resources {
        info!("  Resource: http://{}/resources/{}", addr, entry.name);
    }

    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing(level: &str, format: LogFormat) -> Result<()> {
    let (text, json) = match format {
        LogFormat::Text => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "modelres_server={level},modelres_sdk={level},modelres_repository={level},\
                     modelres_compiler={level},modelres_core={level},tower_http=debug"
                )
                .into()
            }),
        )
        .with(text)
        .with(json)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
