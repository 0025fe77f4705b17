use std::fmt;
use std::str::FromStr;

use crate::models::MetricsSnapshot;

/// Where the returned narrative text comes from.
///
/// The completion is always requested; `Template` discards it and fills the
/// fixed analysis template, `Model` returns the completion under the metrics recap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NarrativeSource {
    #[default]
    Template,
    Model,
}

impl FromStr for NarrativeSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "template" => Ok(NarrativeSource::Template),
            "model" => Ok(NarrativeSource::Model),
            other => Err(format!("expected 'template' or 'model', got '{}'", other)),
        }
    }
}

impl fmt::Display for NarrativeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NarrativeSource::Template => f.write_str("template"),
            NarrativeSource::Model => f.write_str("model"),
        }
    }
}

/// Prompt sent to the language model: every metric as `label: value`, two spaces apart.
pub fn build_analysis_prompt(ticker: &str, metrics: &MetricsSnapshot) -> String {
    let listed = metrics
        .labeled()
        .iter()
        .map(|(label, value)| format!("{}: {}", label, value))
        .collect::<Vec<_>>()
        .join("  ");

    format!(
        "Provide a concise stock analysis for {} based on these metrics:\n{}",
        ticker, listed
    )
}

fn metrics_recap(ticker: &str, m: &MetricsSnapshot) -> String {
    format!(
        r#"Stock Analysis for {ticker}
Key Metrics:

Current Price: {}
52 Week High: {}
52 Week Low: {}
Dividend Yield: {}
Growth %: {}
Market Cap: {}
P/E Ratio: {}
"#,
        m.current_price,
        m.fifty_two_week_high,
        m.fifty_two_week_low,
        m.dividend_yield,
        m.growth_percent,
        m.market_cap,
        m.pe_ratio,
    )
}

/// Fixed analysis text with the metrics substituted in.
pub fn render_template_narrative(ticker: &str, m: &MetricsSnapshot) -> String {
    format!(
        r#"{recap}
Analysis:
The current stock price of {ticker} is {price}, which is down slightly from its 52-week high of {high} and 52-week low of {low}. This wide price range indicates volatility in the stock.
The company's P/E ratio of {pe} and dividend yield of {dividend} suggest moderate valuation and income potential. Its large market cap of {cap} implies it is a significant player in the industry.
However, the negative growth percentage of {growth} is a concerning trend that warrants further investigation. Additional analysis of the company's financials, industry positioning, and strategic initiatives would be needed to fully assess the outlook.
In summary, {ticker} displays both strengths and risks based on the current metrics. A deeper dive into the underlying factors driving performance is recommended to determine if this is a temporary blip or a more significant trend.
"#,
        recap = metrics_recap(ticker, m),
        price = m.current_price,
        high = m.fifty_two_week_high,
        low = m.fifty_two_week_low,
        pe = m.pe_ratio,
        dividend = m.dividend_yield,
        cap = m.market_cap,
        growth = m.growth_percent,
    )
}

/// Metrics recap followed by the model's own text.
pub fn render_model_narrative(ticker: &str, m: &MetricsSnapshot, completion: &str) -> String {
    format!(
        "{}\nAnalysis:\n{}\n",
        metrics_recap(ticker, m),
        completion.trim()
    )
}

pub fn render_narrative(
    source: NarrativeSource,
    ticker: &str,
    metrics: &MetricsSnapshot,
    completion: &str,
) -> String {
    match source {
        NarrativeSource::Template => render_template_narrative(ticker, metrics),
        NarrativeSource::Model => render_model_narrative(ticker, metrics, completion),
    }
}
