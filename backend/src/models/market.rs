use chrono::{DateTime, Utc};
use serde_json::Number;

/// One intraday bar as returned by the market data provider.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

/// Descriptive company figures. Numbers are kept exactly as the provider
/// sent them so they can be rendered without re-rounding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyInfo {
    pub trailing_pe: Option<Number>,
    pub market_cap: Option<Number>,
    pub dividend_yield: Option<Number>,
    pub fifty_two_week_high: Option<Number>,
    pub fifty_two_week_low: Option<Number>,
}
