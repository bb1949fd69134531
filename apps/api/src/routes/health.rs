use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::llm::ProviderKind;
use crate::state::AppState;

/// GET /
/// Service banner.
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "Tailor API",
        "status": "running"
    }))
}

/// GET /health
/// Returns service status plus which provider credentials are configured.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let providers: serde_json::Map<String, Value> = ProviderKind::ALL
        .iter()
        .map(|kind| {
            (
                kind.to_string(),
                json!(state.config.provider(*kind).is_some()),
            )
        })
        .collect();

    Json(json!({
        "status": "healthy",
        "service": "tailor-api",
        "version": env!("CARGO_PKG_VERSION"),
        "providers": providers,
    }))
}
