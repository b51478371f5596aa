use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// Parse a currency amount into signed cents. Accepts commas, a leading
/// dollar sign, and accounting-style parentheses for negatives.
pub fn parse_amount_cents(s: &str) -> Result<i64, ParseError> {
    let s = s.trim();
    let (negative, s) = if s.starts_with('(') && s.ends_with(')') {
        (true, &s[1..s.len() - 1])
    } else {
        (false, s)
    };
    let cleaned = s.replace([',', '$', ' '], "");
    let mut dec =
        Decimal::from_str(&cleaned).map_err(|_| ParseError::InvalidAmount(s.to_string()))?;
    if negative {
        dec = -dec;
    }
    (dec * Decimal::from(100))
        .round()
        .to_i64()
        .ok_or_else(|| ParseError::InvalidAmount(s.to_string()))
}

/// Parse a date, trying the preferred format first and falling back to the
/// formats banks actually emit.
pub fn parse_date(s: &str, preferred: &str) -> Result<NaiveDate, ParseError> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, preferred) {
        return Ok(date);
    }

    for fmt in &[
        "%m/%d/%Y", "%m/%d/%y", "%Y-%m-%d", "%Y/%m/%d", "%m-%d-%Y", "%d-%b-%Y", "%b %d, %Y",
    ] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(ParseError::InvalidDate(s.to_string()))
}

/// Parse a decimal quantity ("12.345" shares), tolerating commas.
pub fn parse_quantity(s: &str) -> Option<Decimal> {
    let cleaned = s.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}
