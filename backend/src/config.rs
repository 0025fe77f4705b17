use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::external::yahoo::{YahooEndpoints, DEFAULT_CRUMB_RETRY};
use crate::logging::LoggingConfig;
use crate::services::llm_service::LlmConfig;
use crate::services::narrative_service::NarrativeSource;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Process-wide configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub http_timeout: Duration,
    pub llm: LlmConfig,
    pub yahoo: YahooEndpoints,
    pub yahoo_crumb_retry: Duration,
    pub narrative_source: NarrativeSource,
    pub expose_upstream_errors: bool,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let http_timeout =
            Duration::from_secs(parse_or(&var, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?);

        let llm_defaults = LlmConfig::default();
        let llm = LlmConfig {
            provider: var("LLM_PROVIDER").unwrap_or(llm_defaults.provider),
            api_key: lookup("GEMINI_API_KEY"),
            model: var("GEMINI_MODEL").unwrap_or(llm_defaults.model),
            base_url: var("GEMINI_BASE_URL").unwrap_or(llm_defaults.base_url),
            max_tokens: parse_opt(&var, "LLM_MAX_TOKENS")?.or(llm_defaults.max_tokens),
            temperature: parse_opt(&var, "LLM_TEMPERATURE")?.or(llm_defaults.temperature),
            timeout: http_timeout,
        };

        let yahoo_defaults = YahooEndpoints::default();
        let yahoo = YahooEndpoints {
            chart_base: var("YAHOO_CHART_BASE_URL").unwrap_or(yahoo_defaults.chart_base),
            summary_base: var("YAHOO_SUMMARY_BASE_URL").unwrap_or(yahoo_defaults.summary_base),
            cookie_url: var("YAHOO_COOKIE_URL").unwrap_or(yahoo_defaults.cookie_url),
        };

        let yahoo_crumb_retry = Duration::from_secs(parse_or(
            &var,
            "YAHOO_CRUMB_RETRY_SECS",
            DEFAULT_CRUMB_RETRY.as_secs(),
        )?);

        for (key, value) in [
            ("GEMINI_BASE_URL", &llm.base_url),
            ("YAHOO_CHART_BASE_URL", &yahoo.chart_base),
            ("YAHOO_SUMMARY_BASE_URL", &yahoo.summary_base),
            ("YAHOO_COOKIE_URL", &yahoo.cookie_url),
        ] {
            url::Url::parse(value).map_err(|e| ConfigError::Invalid {
                key,
                value: value.clone(),
                reason: e.to_string(),
            })?;
        }

        let bind_raw = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: bind_raw.clone(),
                reason: e.to_string(),
            })?;

        let logging_defaults = LoggingConfig::default();
        let logging = LoggingConfig {
            loki_enabled: parse_or(&var, "LOKI_ENABLED", logging_defaults.loki_enabled)?,
            loki_url: var("LOKI_URL"),
            service_name: var("SERVICE_NAME").unwrap_or(logging_defaults.service_name),
            environment: var("ENVIRONMENT").unwrap_or(logging_defaults.environment),
            log_level: var("RUST_LOG").unwrap_or(logging_defaults.log_level),
        };

        Ok(Self {
            bind_addr,
            http_timeout,
            llm,
            yahoo,
            yahoo_crumb_retry,
            narrative_source: parse_or(&var, "NARRATIVE_SOURCE", NarrativeSource::default())?,
            expose_upstream_errors: parse_or(&var, "EXPOSE_UPSTREAM_ERRORS", true)?,
            logging,
        })
    }
}

fn parse_or<T, F>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(var, key)?.unwrap_or(default))
}

fn parse_opt<T, F>(var: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|raw| {
            raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}
