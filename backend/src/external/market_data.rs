use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CompanyInfo, PriceBar};

/// Range of the intraday window used for analysis.
pub const INTRADAY_RANGE: &str = "1d";
/// Bar granularity inside the intraday window.
pub const INTRADAY_INTERVAL: &str = "1m";

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Bars for `ticker` over `range` at `interval`, oldest first.
    /// An unknown ticker yields an empty series rather than an error.
    async fn fetch_intraday_history(
        &self,
        ticker: &str,
        range: &str,
        interval: &str,
    ) -> Result<Vec<PriceBar>, MarketDataError>;

    async fn fetch_company_info(&self, ticker: &str) -> Result<CompanyInfo, MarketDataError>;
}
