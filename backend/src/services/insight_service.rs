use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::AppError;
use crate::external::market_data::{MarketDataProvider, INTRADAY_INTERVAL, INTRADAY_RANGE};
use crate::models::StockAnalysis;
use crate::services::llm_service::LlmService;
use crate::services::metrics_service::build_snapshot;
use crate::services::narrative_service::{build_analysis_prompt, render_narrative, NarrativeSource};

pub const TICKER_REQUIRED: &str = "Ticker symbol is required";

/// Fetches market data for a ticker, derives the metrics snapshot and asks
/// the language model for an analysis.
pub struct InsightService {
    market_data: Arc<dyn MarketDataProvider>,
    llm: Arc<LlmService>,
    narrative_source: NarrativeSource,
}

impl InsightService {
    pub fn new(
        market_data: Arc<dyn MarketDataProvider>,
        llm: Arc<LlmService>,
        narrative_source: NarrativeSource,
    ) -> Self {
        Self {
            market_data,
            llm,
            narrative_source,
        }
    }

    pub fn llm_enabled(&self) -> bool {
        self.llm.is_enabled()
    }

    /// Any failure along the way aborts the whole analysis; the generation
    /// call is not isolated from the metrics.
    pub async fn analyze(&self, ticker: &str) -> Result<StockAnalysis, AppError> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(AppError::Validation(TICKER_REQUIRED.to_string()));
        }

        let history = self
            .market_data
            .fetch_intraday_history(ticker, INTRADAY_RANGE, INTRADAY_INTERVAL)
            .await?;

        let (Some(first), Some(last)) = (history.first(), history.last()) else {
            warn!("No intraday data for {}", ticker);
            return Err(AppError::NotFound(format!(
                "No data available for ticker {}",
                ticker
            )));
        };

        let (Some(initial_price), Some(current_price)) = (first.close, last.close) else {
            warn!("Intraday series for {} is missing close prices", ticker);
            return Err(AppError::DataUnavailable(format!(
                "Unable to fetch price data for ticker {}",
                ticker
            )));
        };

        let info = self.market_data.fetch_company_info(ticker).await?;
        let metrics = build_snapshot(current_price, initial_price, &info);
        info!(
            "Metrics for {}: price {} growth {} ({} bars)",
            ticker,
            metrics.current_price,
            metrics.growth_percent,
            history.len()
        );

        let prompt = build_analysis_prompt(ticker, &metrics);
        let completion = self.llm.generate_completion(prompt).await?;

        let ai_analysis = render_narrative(self.narrative_source, ticker, &metrics, &completion);

        Ok(StockAnalysis {
            metrics,
            ai_analysis,
        })
    }
}
