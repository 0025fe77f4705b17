use serde::{Deserialize, Serialize};

/// Sentinel used for any metric the provider could not supply.
pub const NOT_AVAILABLE: &str = "N/A";

/// Formatted company metrics for one ticker, built fresh per request.
///
/// Every field is either a formatted currency/percent string or [`NOT_AVAILABLE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    #[serde(rename = "Current Price")]
    pub current_price: String,
    #[serde(rename = "Growth %")]
    pub growth_percent: String,
    #[serde(rename = "P/E Ratio")]
    pub pe_ratio: String,
    #[serde(rename = "Market Cap")]
    pub market_cap: String,
    #[serde(rename = "Dividend Yield")]
    pub dividend_yield: String,
    #[serde(rename = "52 Week High")]
    pub fifty_two_week_high: String,
    #[serde(rename = "52 Week Low")]
    pub fifty_two_week_low: String,
}

impl MetricsSnapshot {
    /// Label/value pairs in presentation order.
    pub fn labeled(&self) -> [(&'static str, &str); 7] {
        [
            ("Current Price", self.current_price.as_str()),
            ("Growth %", self.growth_percent.as_str()),
            ("P/E Ratio", self.pe_ratio.as_str()),
            ("Market Cap", self.market_cap.as_str()),
            ("Dividend Yield", self.dividend_yield.as_str()),
            ("52 Week High", self.fifty_two_week_high.as_str()),
            ("52 Week Low", self.fifty_two_week_low.as_str()),
        ]
    }
}

/// Request body for POST /api/stock-analysis
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockAnalysisRequest {
    #[serde(default)]
    pub ticker: Option<String>,
}

/// Response body for POST /api/stock-analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAnalysis {
    pub metrics: MetricsSnapshot,
    #[serde(rename = "aiAnalysis")]
    pub ai_analysis: String,
}
