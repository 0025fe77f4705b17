use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    llm_enabled: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
}

/// Liveness plus whether the language model is configured; without it every
/// analysis request fails.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    info!("GET /health - Health check");
    Json(HealthResponse {
        status: "OK",
        llm_enabled: state.insight_service.llm_enabled(),
    })
}
