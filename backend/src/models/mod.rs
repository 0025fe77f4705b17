mod analysis;
mod market;
mod stock;

pub use analysis::{MetricsSnapshot, StockAnalysis, StockAnalysisRequest, NOT_AVAILABLE};
pub use market::{CompanyInfo, PriceBar};
pub use stock::{tracked_stocks, TrackedStock};
