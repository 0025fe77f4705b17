//! End-to-end tests for POST /api/stock-analysis
//!
//! The router is driven in-process with fake market data and language model
//! providers, so no network access is needed.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::DateTime;
use regex::Regex;
use serde_json::{json, Number, Value};
use tower::ServiceExt;

use stock_insight_backend::create_app;
use stock_insight_backend::errors::LlmError;
use stock_insight_backend::external::market_data::{MarketDataError, MarketDataProvider};
use stock_insight_backend::models::{CompanyInfo, PriceBar};
use stock_insight_backend::services::insight_service::InsightService;
use stock_insight_backend::services::llm_service::{LlmProvider, LlmService};
use stock_insight_backend::services::narrative_service::NarrativeSource;
use stock_insight_backend::AppState;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

enum History {
    Closes(Vec<Option<f64>>),
    Fails(String),
}

struct FakeMarketData {
    history: History,
    info: CompanyInfo,
}

#[async_trait]
impl MarketDataProvider for FakeMarketData {
    async fn fetch_intraday_history(
        &self,
        _ticker: &str,
        _range: &str,
        _interval: &str,
    ) -> Result<Vec<PriceBar>, MarketDataError> {
        match &self.history {
            History::Fails(msg) => Err(MarketDataError::Network(msg.clone())),
            History::Closes(closes) => Ok(closes
                .iter()
                .enumerate()
                .map(|(i, close)| PriceBar {
                    timestamp: DateTime::from_timestamp(1_700_000_000 + i as i64 * 60, 0).unwrap(),
                    open: *close,
                    high: *close,
                    low: *close,
                    close: *close,
                    volume: Some(100),
                })
                .collect()),
        }
    }

    async fn fetch_company_info(&self, _ticker: &str) -> Result<CompanyInfo, MarketDataError> {
        Ok(self.info.clone())
    }
}

struct CannedLlm(Result<String, String>);

#[async_trait]
impl LlmProvider for CannedLlm {
    async fn generate_completion(&self, _prompt: String) -> Result<String, LlmError> {
        self.0.clone().map_err(LlmError::ApiError)
    }
}

fn aapl_info() -> CompanyInfo {
    CompanyInfo {
        trailing_pe: Number::from_f64(28.5),
        market_cap: Some(Number::from(2_500_000_000_000u64)),
        dividend_yield: Number::from_f64(0.005),
        fifty_two_week_high: Some(Number::from(180)),
        fifty_two_week_low: Some(Number::from(120)),
    }
}

fn aapl_closes() -> Vec<Option<f64>> {
    vec![Some(150.0), Some(151.2), Some(149.8), Some(153.4), Some(155.0)]
}

struct TestApp {
    history: History,
    info: CompanyInfo,
    llm: Result<String, String>,
    source: NarrativeSource,
    expose_upstream_errors: bool,
}

impl TestApp {
    fn new(history: History) -> Self {
        Self {
            history,
            info: aapl_info(),
            llm: Ok("Model commentary.".to_string()),
            source: NarrativeSource::Template,
            expose_upstream_errors: true,
        }
    }

    fn build(self) -> Router {
        let market = FakeMarketData {
            history: self.history,
            info: self.info,
        };
        let llm = LlmService::with_provider(Arc::new(CannedLlm(self.llm)));
        let service = InsightService::new(Arc::new(market), Arc::new(llm), self.source);

        create_app(AppState {
            insight_service: Arc::new(service),
            expose_upstream_errors: self.expose_upstream_errors,
        })
    }
}

async fn post_analysis(app: Router, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/stock-analysis")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, serde_json::from_slice(&bytes).unwrap())
}

fn parse_money(value: &str) -> f64 {
    value.trim_start_matches('$').replace(',', "").parse().unwrap()
}

// ---------------------------------------------------------------------------
// Success path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_aapl_scenario_metrics() {
    let app = TestApp::new(History::Closes(aapl_closes())).build();

    let (status, body) = post_analysis(app, r#"{"ticker": "AAPL"}"#).await;

    assert_eq!(status, StatusCode::OK);
    let metrics = &body["metrics"];
    assert_eq!(metrics["Current Price"], "$155.00");
    assert_eq!(metrics["Growth %"], "3.33%");
    assert_eq!(metrics["P/E Ratio"], "28.5");
    assert_eq!(metrics["Market Cap"], "$2,500,000,000,000");
    assert_eq!(metrics["Dividend Yield"], "0.50%");
    assert_eq!(metrics["52 Week High"], "$180");
    assert_eq!(metrics["52 Week Low"], "$120");

    let narrative = body["aiAnalysis"].as_str().unwrap();
    assert!(narrative.starts_with("Stock Analysis for AAPL"));
    assert!(!narrative.contains("Model commentary."));
}

#[tokio::test]
async fn test_every_metric_is_formatted_or_sentinel() {
    let pattern = Regex::new(r"^\$?-?[\d,.]+%?$").unwrap();
    let sparse_info = CompanyInfo {
        trailing_pe: Number::from_f64(12.75),
        ..CompanyInfo::default()
    };

    for (closes, info) in [
        (aapl_closes(), aapl_info()),
        (vec![Some(80.0), Some(78.1)], sparse_info),
        (vec![Some(0.0), Some(3.0)], CompanyInfo::default()),
    ] {
        let mut test_app = TestApp::new(History::Closes(closes));
        test_app.info = info;

        let (status, body) = post_analysis(test_app.build(), r#"{"ticker": "TOL"}"#).await;
        assert_eq!(status, StatusCode::OK);

        for (label, value) in body["metrics"].as_object().unwrap() {
            let value = value.as_str().unwrap();
            assert!(
                value == "N/A" || pattern.is_match(value),
                "{} has unexpected value {:?}",
                label,
                value
            );
        }
    }
}

#[tokio::test]
async fn test_growth_matches_recomputation_from_prices() {
    let closes = vec![Some(48.37), Some(49.0), Some(47.91)];
    let app = TestApp::new(History::Closes(closes)).build();

    let (_, body) = post_analysis(app, r#"{"ticker": "GRBK"}"#).await;
    let metrics = &body["metrics"];

    let current = parse_money(metrics["Current Price"].as_str().unwrap());
    let reported: f64 = metrics["Growth %"]
        .as_str()
        .unwrap()
        .trim_end_matches('%')
        .parse()
        .unwrap();
    let recomputed = (current - 48.37) / 48.37 * 100.0;

    assert!((reported - recomputed).abs() < 0.01);
}

#[tokio::test]
async fn test_zero_initial_price_reports_not_available() {
    let app = TestApp::new(History::Closes(vec![Some(0.0), Some(12.0)])).build();

    let (status, body) = post_analysis(app, r#"{"ticker": "CVCO"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metrics"]["Growth %"], "N/A");
}

#[tokio::test]
async fn test_model_narrative_source() {
    let mut test_app = TestApp::new(History::Closes(aapl_closes()));
    test_app.source = NarrativeSource::Model;

    let (status, body) = post_analysis(test_app.build(), r#"{"ticker": "AAPL"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["aiAnalysis"]
        .as_str()
        .unwrap()
        .ends_with("Analysis:\nModel commentary.\n"));
}

// ---------------------------------------------------------------------------
// Failure paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_missing_or_empty_ticker_is_rejected() {
    for body in [r#"{}"#, r#"{"ticker": ""}"#, r#"{"ticker": null}"#, r#"{"ticker": "  "}"#] {
        let app = TestApp::new(History::Closes(aapl_closes())).build();

        let (status, response) = post_analysis(app, body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "body {}", body);
        assert_eq!(response, json!({ "error": "Ticker symbol is required" }));
    }
}

#[tokio::test]
async fn test_empty_series_is_server_error() {
    let app = TestApp::new(History::Closes(vec![])).build();

    let (status, body) = post_analysis(app, r#"{"ticker": "XYZQ"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "No data available for ticker XYZQ" }));
}

#[tokio::test]
async fn test_missing_close_is_server_error() {
    let app = TestApp::new(History::Closes(vec![None, Some(10.0)])).build();

    let (status, body) = post_analysis(app, r#"{"ticker": "IBP"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Unable to fetch price data for ticker IBP");
}

#[tokio::test]
async fn test_network_failure_text_is_returned() {
    let app = TestApp::new(History::Fails("dns error: no such host".to_string())).build();

    let (status, body) = post_analysis(app, r#"{"ticker": "AAPL"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "network error: dns error: no such host" }));
}

#[tokio::test]
async fn test_generation_failure_aborts_request() {
    let mut test_app = TestApp::new(History::Closes(aapl_closes()));
    test_app.llm = Err("HTTP 503: model overloaded".to_string());

    let (status, body) = post_analysis(test_app.build(), r#"{"ticker": "AAPL"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("metrics").is_none());
    assert_eq!(body["error"], "LLM API error: HTTP 503: model overloaded");
}

#[tokio::test]
async fn test_redacted_upstream_errors() {
    let mut test_app = TestApp::new(History::Fails("proxy 10.0.0.7 refused".to_string()));
    test_app.expose_upstream_errors = false;

    let (status, body) = post_analysis(test_app.build(), r#"{"ticker": "AAPL"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Upstream provider error" }));
}

#[tokio::test]
async fn test_redaction_keeps_client_facing_messages() {
    let mut test_app = TestApp::new(History::Closes(vec![]));
    test_app.expose_upstream_errors = false;

    let (_, body) = post_analysis(test_app.build(), r#"{"ticker": "XYZQ"}"#).await;

    assert_eq!(body["error"], "No data available for ticker XYZQ");
}
