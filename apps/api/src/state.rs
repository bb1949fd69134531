use std::sync::Arc;

use crate::config::Config;
use crate::ingest::job_posting::JobFetcher;
use crate::llm::orchestrator::GenerationEngine;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<GenerationEngine>,
    pub fetcher: JobFetcher,
    pub config: Config,
}
