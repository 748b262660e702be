//! Display formatting for cells and labels.
//!
//! These are pure functions over bound values. A [`CellFormat`] packages one
//! of them as a table column renderer and can be named in node JSON
//! (`"currency"`, `"currency:EUR"`, `"date:long"`, `"truncate:24"`).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

use crate::error::ConfigurationError;

/// Render any bound value as display text.
///
/// Absent and null values render empty. Strings render without quotes.
pub fn display_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

// ============================================================================
// Currency
// ============================================================================

/// Currency code (ISO 4217).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    /// Create a new currency code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    /// US Dollar
    pub fn usd() -> Self {
        Self::new("USD")
    }

    /// Euro
    pub fn eur() -> Self {
        Self::new("EUR")
    }

    /// Japanese Yen
    pub fn jpy() -> Self {
        Self::new("JPY")
    }

    /// Symbol for well-known currencies, or the code itself.
    pub fn symbol(&self) -> &str {
        match self.0.as_str() {
            "USD" => "$",
            "EUR" => "\u{20ac}",
            "GBP" => "\u{00a3}",
            "JPY" | "CNY" => "\u{00a5}",
            other => other,
        }
    }

    fn minor_digits(&self) -> usize {
        match self.0.as_str() {
            "JPY" | "KRW" => 0,
            _ => 2,
        }
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::usd()
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Format an amount with a currency symbol and thousands separators.
///
/// ```
/// use horizon_facet::format::{format_currency, CurrencyCode};
///
/// assert_eq!(format_currency(1234.5, &CurrencyCode::usd()), "$1,234.50");
/// assert_eq!(format_currency(-3.0, &CurrencyCode::eur()), "-3.00 \u{20ac}");
/// ```
pub fn format_currency(amount: f64, currency: &CurrencyCode) -> String {
    let digits = currency.minor_digits();
    let fixed = format!("{:.*}", digits, amount.abs());
    let (whole, fraction) = match fixed.split_once('.') {
        Some((whole, fraction)) => (whole.to_string(), Some(fraction.to_string())),
        None => (fixed, None),
    };

    let mut number = with_thousands(&whole, ',');
    if let Some(fraction) = fraction {
        number.push('.');
        number.push_str(&fraction);
    }

    let sign = if amount < 0.0 && number.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    let symbol = currency.symbol();
    match currency.0.as_str() {
        "EUR" => format!("{sign}{number} {symbol}"),
        _ => format!("{sign}{symbol}{number}"),
    }
}

fn with_thousands(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut result = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(separator);
        }
        result.push(c);
    }
    result
}

// ============================================================================
// Dates
// ============================================================================

/// Display format for dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFormat {
    /// Short format: MM/DD/YYYY
    #[default]
    Short,
    /// Long format: Month DD, YYYY
    Long,
    /// ISO format: YYYY-MM-DD
    Iso,
}

impl DateFormat {
    fn pattern(&self) -> &'static str {
        match self {
            Self::Short => "%m/%d/%Y",
            Self::Long => "%B %-d, %Y",
            Self::Iso => "%Y-%m-%d",
        }
    }
}

/// Format an ISO-8601 date or RFC 3339 timestamp.
///
/// Returns `None` when the input is neither.
pub fn format_date(input: &str, format: DateFormat) -> Option<String> {
    let input = input.trim();
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(input).ok().map(|dt| dt.date_naive()))?;
    Some(date.format(format.pattern()).to_string())
}

// ============================================================================
// Strings
// ============================================================================

/// Shorten `text` to at most `max_chars` characters, ending with an ellipsis.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut result: String = text.chars().take(max_chars - 1).collect();
    result.push('\u{2026}');
    result
}

// ============================================================================
// Column renderers
// ============================================================================

/// A named cell renderer.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellFormat {
    /// Plain display text.
    #[default]
    Text,
    /// Numeric amount as currency.
    Currency(CurrencyCode),
    /// Date string reformatted.
    Date(DateFormat),
    /// Text shortened to a character count.
    Truncate(usize),
}

impl CellFormat {
    /// Render a bound value for display.
    ///
    /// Values the format cannot interpret fall back to plain display text.
    pub fn render(&self, value: Option<&Value>) -> Value {
        let text = match self {
            Self::Text => display_text(value),
            Self::Currency(code) => match value.and_then(Value::as_f64) {
                Some(amount) => format_currency(amount, code),
                None => display_text(value),
            },
            Self::Date(format) => match value.and_then(Value::as_str) {
                Some(s) => format_date(s, *format).unwrap_or_else(|| s.to_string()),
                None => display_text(value),
            },
            Self::Truncate(max) => truncate(&display_text(value), *max),
        };
        Value::String(text)
    }
}

impl FromStr for CellFormat {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name.trim(), Some(arg.trim())),
            None => (s.trim(), None),
        };

        match (name, arg) {
            ("text", None) => Ok(Self::Text),
            ("currency", None) => Ok(Self::Currency(CurrencyCode::default())),
            ("currency", Some(code)) => Ok(Self::Currency(CurrencyCode::new(code))),
            ("date", None | Some("short")) => Ok(Self::Date(DateFormat::Short)),
            ("date", Some("long")) => Ok(Self::Date(DateFormat::Long)),
            ("date", Some("iso")) => Ok(Self::Date(DateFormat::Iso)),
            ("truncate", Some(n)) => n
                .parse()
                .map(Self::Truncate)
                .map_err(|_| ConfigurationError::malformed(format!("invalid truncate length '{n}'"))),
            _ => Err(ConfigurationError::malformed(format!("unknown cell format '{s}'"))),
        }
    }
}
