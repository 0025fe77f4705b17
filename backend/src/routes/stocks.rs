use axum::{routing::get, Json, Router};
use tracing::info;

use crate::models::{tracked_stocks, TrackedStock};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_stocks))
}

/// GET /api/stocks
/// Tickers offered by the stock picker
async fn list_stocks() -> Json<Vec<TrackedStock>> {
    info!("GET /api/stocks");
    Json(tracked_stocks())
}
