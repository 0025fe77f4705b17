pub mod insight_service;
pub mod llm_service;
pub mod metrics_service;
pub mod narrative_service;
