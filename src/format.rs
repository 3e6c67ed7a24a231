//! Display formatting shared by the patient panel and the admin form.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::config::CURRENCY;

/// Leading numeric prefix, as `parseFloat` reads it.
static NUMERIC_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").unwrap()
});

/// Result of normalising an amount field on blur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountFormat {
    /// Field was empty; leave it alone.
    Empty,
    /// Reformatted to two decimals.
    Formatted(String),
    /// No numeric prefix; leave it alone.
    Unparseable,
}

/// Read the leading number of `raw` the way `parseFloat` does:
/// `"12.5kg"` → 12.5, `"  7"` → 7, `"abc"` → none.
pub fn parse_float_prefix(raw: &str) -> Option<f64> {
    let caps = NUMERIC_PREFIX.captures(raw)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    value.is_finite().then_some(value)
}

/// Normalise an amount input to two decimals.
pub fn normalize_amount(raw: &str) -> AmountFormat {
    if raw.is_empty() {
        return AmountFormat::Empty;
    }
    match parse_float_prefix(raw) {
        Some(value) => AmountFormat::Formatted(to_fixed_2(value)),
        None => AmountFormat::Unparseable,
    }
}

fn to_fixed_2(value: f64) -> String {
    let formatted = format!("{value:.2}");
    // "-0.00" reads as a negative amount; collapse it
    if formatted == "-0.00" {
        "0.00".to_string()
    } else {
        formatted
    }
}

/// Shortest decimal form of a number: 67.0 → "67", 67.5 → "67.5".
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}

/// CSS width for the progress bar, e.g. `"67%"`.
pub fn progress_width(progress: f64) -> String {
    format!("{}%", format_number(progress))
}

/// Label under the progress bar, e.g. `"67% Complete"`.
pub fn progress_text(progress: f64) -> String {
    format!("{}% Complete", format_number(progress))
}

/// Treatment cost with thousands separators and the currency suffix:
/// 150000 → "150,000 TZS", 1250.5 → "1,250.50 TZS".
pub fn format_cost(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    if cents == "00" {
        format!("{sign}{grouped} {CURRENCY}")
    } else {
        format!("{sign}{grouped}.{cents} {CURRENCY}")
    }
}

/// Day-of-month and short month name shown on a treatment card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateBadge {
    pub day: u32,
    pub month: String,
}

impl DateBadge {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            day: date.day(),
            month: date.format("%b").to_string(),
        }
    }
}

/// Escape text for inclusion in HTML content or a quoted attribute.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
