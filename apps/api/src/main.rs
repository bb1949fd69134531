mod config;
mod errors;
mod generation;
mod ingest;
mod llm;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::ingest::job_posting::JobFetcher;
use crate::llm::orchestrator::GenerationEngine;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // One pooled client for all provider adapters. Generation calls can
    // legitimately run long, hence the generous timeout.
    let llm_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(llm::REQUEST_TIMEOUT_SECS))
        .build()?;

    let engine = GenerationEngine::from_config(&config, llm_client);
    info!("generation engine initialized (order: {:?})", config.provider_order);

    let fetcher = JobFetcher::new();

    let state = AppState {
        engine: Arc::new(engine),
        fetcher,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict to the frontend origins before exposure

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
