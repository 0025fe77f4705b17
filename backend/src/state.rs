use std::sync::Arc;

use crate::services::insight_service::InsightService;

#[derive(Clone)]
pub struct AppState {
    pub insight_service: Arc<InsightService>,
    pub expose_upstream_errors: bool,
}
