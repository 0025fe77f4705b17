use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Number, Value};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use url::Url;

use crate::external::market_data::{MarketDataError, MarketDataProvider};
use crate::models::{CompanyInfo, PriceBar};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const SUMMARY_MODULES: &str = "summaryDetail,price";

/// Base URLs for the Yahoo Finance endpoints, overridable for tests.
#[derive(Debug, Clone)]
pub struct YahooEndpoints {
    pub chart_base: String,
    pub summary_base: String,
    pub cookie_url: String,
}

impl Default for YahooEndpoints {
    fn default() -> Self {
        Self {
            chart_base: "https://query1.finance.yahoo.com".to_string(),
            summary_base: "https://query2.finance.yahoo.com".to_string(),
            cookie_url: "https://fc.yahoo.com".to_string(),
        }
    }
}

/// How long a failed crumb negotiation is remembered before trying again.
pub const DEFAULT_CRUMB_RETRY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
enum CrumbState {
    Unknown,
    Ready(String),
    Failed(Instant),
}

/// Yahoo Finance provider - chart API for intraday bars, quoteSummary for company figures.
///
/// No API key required. quoteSummary wants a session cookie plus a crumb token;
/// both are obtained on first use and reused for the life of the process. A failed
/// negotiation is not retried until `crumb_retry` has passed.
pub struct YahooFinanceProvider {
    client: reqwest::Client,
    endpoints: YahooEndpoints,
    crumb: RwLock<CrumbState>,
    // Single flight for crumb negotiation; never held while `crumb` is locked
    crumb_fetch: Mutex<()>,
    crumb_retry: Duration,
}

impl YahooFinanceProvider {
    pub fn new(endpoints: YahooEndpoints, timeout: Duration) -> Result<Self, MarketDataError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoints,
            crumb: RwLock::new(CrumbState::Unknown),
            crumb_fetch: Mutex::new(()),
            crumb_retry: DEFAULT_CRUMB_RETRY,
        })
    }

    pub fn with_crumb_retry(mut self, crumb_retry: Duration) -> Self {
        self.crumb_retry = crumb_retry;
        self
    }

    fn endpoint(base: &str, segments: &[&str]) -> Result<Url, MarketDataError> {
        let mut url = Url::parse(base)
            .map_err(|e| MarketDataError::Network(format!("invalid endpoint {}: {}", base, e)))?;

        url.path_segments_mut()
            .map_err(|_| MarketDataError::Network(format!("invalid endpoint {}", base)))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// `None` means a negotiation is due; `Some(None)` means we are still backing off.
    async fn cached_crumb(&self) -> Option<Option<String>> {
        match &*self.crumb.read().await {
            CrumbState::Ready(crumb) => Some(Some(crumb.clone())),
            CrumbState::Failed(at) if at.elapsed() < self.crumb_retry => Some(None),
            _ => None,
        }
    }

    async fn crumb(&self) -> Option<String> {
        if let Some(cached) = self.cached_crumb().await {
            return cached;
        }

        let _flight = self.crumb_fetch.lock().await;
        // Another caller may have finished negotiating while we waited
        if let Some(cached) = self.cached_crumb().await {
            return cached;
        }

        let (state, crumb) = match self.fetch_crumb().await {
            Ok(crumb) => {
                info!("Obtained Yahoo Finance session crumb");
                (CrumbState::Ready(crumb.clone()), Some(crumb))
            }
            Err(e) => {
                warn!(
                    "Could not obtain Yahoo Finance crumb, continuing without it for {:?}: {}",
                    self.crumb_retry, e
                );
                (CrumbState::Failed(Instant::now()), None)
            }
        };
        *self.crumb.write().await = state;

        crumb
    }

    async fn fetch_crumb(&self) -> Result<String, MarketDataError> {
        // fc.yahoo.com answers 404 but still sets the session cookie
        self.client
            .get(&self.endpoints.cookie_url)
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        let url = Self::endpoint(&self.endpoints.chart_base, &["v1", "test", "getcrumb"])?;
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(MarketDataError::BadResponse(format!(
                "crumb request returned HTTP {}",
                resp.status()
            )));
        }

        let crumb = resp
            .text()
            .await
            .map_err(|e| MarketDataError::Parse(e.to_string()))?
            .trim()
            .to_string();

        if crumb.is_empty() || crumb.contains('<') {
            return Err(MarketDataError::BadResponse("empty crumb".into()));
        }

        Ok(crumb)
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteSeries {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    result: Option<Vec<QuoteSummaryData>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryData {
    summary_detail: Option<SummaryDetail>,
    price: Option<PriceModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<YahooValue>,
    market_cap: Option<YahooValue>,
    dividend_yield: Option<YahooValue>,
    fifty_two_week_high: Option<YahooValue>,
    fifty_two_week_low: Option<YahooValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    market_cap: Option<YahooValue>,
}

/// Yahoo wraps numbers as `{"raw": 28.5, "fmt": "28.50"}`; `raw` may also be
/// a string such as "Infinity", which is treated as missing.
#[derive(Debug, Default, Deserialize)]
struct YahooValue {
    #[serde(default)]
    raw: Value,
}

fn raw_number(value: Option<YahooValue>) -> Option<Number> {
    match value?.raw {
        Value::Number(n) => Some(n),
        _ => None,
    }
}

fn value_at(series: &[Option<f64>], i: usize) -> Option<f64> {
    series.get(i).copied().flatten()
}

fn parse_chart(body: ChartResponse) -> Result<Vec<PriceBar>, MarketDataError> {
    if let Some(error) = body.chart.error {
        if error.description.contains("No data found") {
            return Ok(Vec::new());
        }
        return Err(MarketDataError::BadResponse(error.description));
    }

    let Some(result) = body.chart.result.and_then(|results| results.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let len = result.timestamp.len();

    for (name, count) in [
        ("open", quote.open.len()),
        ("high", quote.high.len()),
        ("low", quote.low.len()),
        ("close", quote.close.len()),
        ("volume", quote.volume.len()),
    ] {
        if count != 0 && count != len {
            return Err(MarketDataError::Parse(format!(
                "{} has {} values for {} timestamps",
                name, count, len
            )));
        }
    }

    let mut bars = Vec::with_capacity(len);
    for (i, ts) in result.timestamp.iter().enumerate() {
        let open = value_at(&quote.open, i);
        let high = value_at(&quote.high, i);
        let low = value_at(&quote.low, i);
        let close = value_at(&quote.close, i);

        // Rows with no prices at all carry nothing
        if open.is_none() && high.is_none() && low.is_none() && close.is_none() {
            continue;
        }

        let timestamp = DateTime::from_timestamp(*ts, 0)
            .ok_or_else(|| MarketDataError::Parse(format!("bad timestamp {}", ts)))?;

        bars.push(PriceBar {
            timestamp,
            open,
            high,
            low,
            close,
            volume: quote.volume.get(i).copied().flatten(),
        });
    }

    bars.sort_by_key(|bar| bar.timestamp);

    Ok(bars)
}

fn parse_quote_summary(body: QuoteSummaryResponse) -> CompanyInfo {
    let Some(data) = body.quote_summary.result.and_then(|results| results.into_iter().next())
    else {
        return CompanyInfo::default();
    };

    let detail = data.summary_detail.unwrap_or_default();
    let price = data.price.unwrap_or_default();

    CompanyInfo {
        trailing_pe: raw_number(detail.trailing_pe),
        market_cap: raw_number(detail.market_cap).or_else(|| raw_number(price.market_cap)),
        dividend_yield: raw_number(detail.dividend_yield),
        fifty_two_week_high: raw_number(detail.fifty_two_week_high),
        fifty_two_week_low: raw_number(detail.fifty_two_week_low),
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    async fn fetch_intraday_history(
        &self,
        ticker: &str,
        range: &str,
        interval: &str,
    ) -> Result<Vec<PriceBar>, MarketDataError> {
        let url = Self::endpoint(&self.endpoints.chart_base, &["v8", "finance", "chart", ticker])?;
        debug!("Fetching Yahoo chart for {} (range={}, interval={})", ticker, range, interval);

        let resp = self
            .client
            .get(url)
            .query(&[("range", range), ("interval", interval)])
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            info!("Yahoo chart has no data for {}", ticker);
            return Ok(Vec::new());
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited);
        }
        if !status.is_success() {
            return Err(MarketDataError::BadResponse(format!("HTTP {}", status)));
        }

        let body: ChartResponse = resp
            .json()
            .await
            .map_err(|e| MarketDataError::Parse(e.to_string()))?;

        let bars = parse_chart(body)?;
        debug!("Yahoo chart returned {} bars for {}", bars.len(), ticker);

        Ok(bars)
    }

    async fn fetch_company_info(&self, ticker: &str) -> Result<CompanyInfo, MarketDataError> {
        let mut url = Self::endpoint(
            &self.endpoints.summary_base,
            &["v10", "finance", "quoteSummary", ticker],
        )?;
        url.query_pairs_mut().append_pair("modules", SUMMARY_MODULES);
        if let Some(crumb) = self.crumb().await {
            url.query_pairs_mut().append_pair("crumb", &crumb);
        }

        debug!("Fetching Yahoo quoteSummary for {}", ticker);

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MarketDataError::Network(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            info!("Yahoo quoteSummary has no data for {}", ticker);
            return Ok(CompanyInfo::default());
        }
        if status == StatusCode::UNAUTHORIZED {
            // Stale crumb; the next request negotiates a new one
            *self.crumb.write().await = CrumbState::Unknown;
            return Err(MarketDataError::BadResponse(format!("HTTP {}", status)));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited);
        }
        if !status.is_success() {
            return Err(MarketDataError::BadResponse(format!("HTTP {}", status)));
        }

        let body: QuoteSummaryResponse = resp
            .json()
            .await
            .map_err(|e| MarketDataError::Parse(e.to_string()))?;

        Ok(parse_quote_summary(body))
    }
}
