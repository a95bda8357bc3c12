//! Main entry point for the edit-serving worker

use std::sync::Arc;

use edit_serving::{
    config::Settings,
    engine::http::HttpEngine,
    server::{self, queue::JobQueue, ServerState},
    worker::JobHandler,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::load()?;
    settings.validate()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.clone()));

    if settings.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }

    info!("Starting edit-serving worker");

    // The engine is created once per worker process and owned by the job
    // queue's worker task for the lifetime of the process.
    let engine = Arc::new(HttpEngine::new(&settings.engine)?);
    info!(
        engine = %settings.engine.name,
        url = %settings.engine.base_url,
        "Engine configured"
    );

    let handler = JobHandler::new(engine);
    let queue = JobQueue::with_config(handler, settings.queue.clone());

    let state = Arc::new(ServerState { queue });
    let app = server::create_router(state, settings.auth.api_keys.clone());

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
