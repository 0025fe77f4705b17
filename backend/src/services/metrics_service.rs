use serde_json::Number;

use crate::models::{CompanyInfo, MetricsSnapshot, NOT_AVAILABLE};

/// Percent change from `initial` to `current`; `None` when `initial` is zero.
pub fn growth_percent(current: f64, initial: f64) -> Option<f64> {
    if initial == 0.0 {
        return None;
    }
    Some((current - initial) / initial * 100.0)
}

pub fn format_currency(value: f64) -> String {
    format!("${:.2}", value)
}

pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

/// Integer with `,` between each group of three digits.
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

fn format_market_cap(value: Option<&Number>) -> String {
    let cap = value.and_then(|n| {
        n.as_i64()
            .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64))
    });

    match cap {
        Some(cap) if cap != 0 => format!("${}", format_thousands(cap)),
        _ => NOT_AVAILABLE.to_string(),
    }
}

// Rendered exactly as the provider sent it: 180 stays "180", 199.62 stays "199.62".
fn verbatim(value: Option<&Number>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), Number::to_string)
}

fn verbatim_currency(value: Option<&Number>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |n| format!("${}", n))
}

/// Build the formatted snapshot from the first/last close and company info.
///
/// A missing dividend yield is rendered as `0.00%`, the same as a true zero.
pub fn build_snapshot(current_price: f64, initial_price: f64, info: &CompanyInfo) -> MetricsSnapshot {
    let dividend_yield = info
        .dividend_yield
        .as_ref()
        .and_then(Number::as_f64)
        .unwrap_or(0.0);

    MetricsSnapshot {
        current_price: format_currency(current_price),
        growth_percent: growth_percent(current_price, initial_price)
            .map_or_else(|| NOT_AVAILABLE.to_string(), format_percent),
        pe_ratio: verbatim(info.trailing_pe.as_ref()),
        market_cap: format_market_cap(info.market_cap.as_ref()),
        dividend_yield: format_percent(dividend_yield * 100.0),
        fifty_two_week_high: verbatim_currency(info.fifty_two_week_high.as_ref()),
        fifty_two_week_low: verbatim_currency(info.fifty_two_week_low.as_ref()),
    }
}
