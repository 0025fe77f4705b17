use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::routes::{health, stock_analysis, stocks};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/stock-analysis", stock_analysis::router())
        .nest("/api/stocks", stocks::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
