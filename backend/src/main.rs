use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use stock_insight_backend::app;
use stock_insight_backend::config::AppConfig;
use stock_insight_backend::external::yahoo::YahooFinanceProvider;
use stock_insight_backend::logging;
use stock_insight_backend::services::insight_service::InsightService;
use stock_insight_backend::services::llm_service::LlmService;
use stock_insight_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("invalid configuration")?;

    // Initialize logging before anything else runs
    logging::init_logging(config.logging.clone())?;

    let market_data = YahooFinanceProvider::new(config.yahoo.clone(), config.http_timeout)
        .context("failed to create Yahoo Finance client")?
        .with_crumb_retry(config.yahoo_crumb_retry);
    tracing::info!("📊 Using market data provider: Yahoo Finance");

    let llm_service = LlmService::new(config.llm.clone());
    if !llm_service.is_enabled() {
        tracing::warn!("Language model is disabled; /api/stock-analysis will return errors until GEMINI_API_KEY is set");
    }
    tracing::info!("📝 Narrative source: {}", config.narrative_source);

    let insight_service = InsightService::new(
        Arc::new(market_data),
        Arc::new(llm_service),
        config.narrative_source,
    );

    let state = AppState {
        insight_service: Arc::new(insight_service),
        expose_upstream_errors: config.expose_upstream_errors,
    };
    let app = app::create_app(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("🚀 Stock insight backend running at http://{}/", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
