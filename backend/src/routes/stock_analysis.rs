use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{StockAnalysis, StockAnalysisRequest};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(analyze_stock))
}

/// POST /api/stock-analysis
/// Metrics snapshot and narrative for one ticker
pub async fn analyze_stock(
    State(state): State<AppState>,
    payload: Result<Json<StockAnalysisRequest>, JsonRejection>,
) -> Result<Json<StockAnalysis>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("POST /api/stock-analysis - rejected body: {}", rejection.body_text());
        AppError::Validation(rejection.body_text())
    })?;

    let ticker = request.ticker.unwrap_or_default();
    info!("POST /api/stock-analysis - ticker: {}", ticker.trim());

    match state.insight_service.analyze(&ticker).await {
        Ok(analysis) => Ok(Json(analysis)),
        Err(e) => {
            match &e {
                AppError::Validation(_) | AppError::NotFound(_) | AppError::DataUnavailable(_) => {
                    warn!("Stock analysis for '{}' failed: {}", ticker.trim(), e)
                }
                _ => error!("Stock analysis for '{}' failed: {}", ticker.trim(), e),
            }

            if state.expose_upstream_errors {
                Err(e)
            } else {
                Err(e.redacted())
            }
        }
    }
}
