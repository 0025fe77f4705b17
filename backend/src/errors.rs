use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use thiserror::Error;

use crate::external::market_data::MarketDataError;

/// Message returned in place of provider error text when upstream errors are redacted.
pub const REDACTED_UPSTREAM_MESSAGE: &str = "Upstream provider error";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    DataUnavailable(String),
    #[error("{0}")]
    MarketData(#[from] MarketDataError),
    #[error("{0}")]
    Llm(#[from] LlmError),
    #[error("{0}")]
    Upstream(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Replaces provider error text with a generic message.
    /// Client-facing messages (validation, not found, data unavailable) are kept.
    pub fn redacted(self) -> Self {
        match self {
            AppError::MarketData(_) | AppError::Llm(_) | AppError::Upstream(_) => {
                AppError::Upstream(REDACTED_UPSTREAM_MESSAGE.to_string())
            }
            other => other,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM features are disabled (set GEMINI_API_KEY to enable)")]
    Disabled,
    #[error("LLM network error: {0}")]
    NetworkError(String),
    #[error("LLM API error: {0}")]
    ApiError(String),
    #[error("Invalid LLM response: {0}")]
    InvalidResponse(String),
    #[error("LLM rate limited by provider")]
    RateLimited,
    #[error("LLM request timed out")]
    Timeout,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
