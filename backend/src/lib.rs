//! Stock insight backend.
//!
//! Serves `POST /api/stock-analysis`: intraday prices and company figures from
//! Yahoo Finance are turned into a metrics snapshot, a Gemini completion is
//! requested for them, and both come back as one JSON payload.

pub mod app;
pub mod config;
pub mod errors;
pub mod external;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use app::create_app;
pub use errors::AppError;
pub use state::AppState;
