// src/models/series.rs

//! Time series points, the period window they are fetched for, and the
//! rounding rule applied to fetched values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// One observation of an indicator.
///
/// Serialized as `{"year": "...", "value": ...}`, the shape the frontend reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Period label, typically a four-digit year
    #[serde(rename = "year")]
    pub period: String,

    /// Observed value, already rounded
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(period: impl Into<String>, value: f64) -> Self {
        Self {
            period: period.into(),
            value,
        }
    }
}

/// Ordered observations of one indicator. Empty means "no data".
pub type TimeSeries = Vec<SeriesPoint>;

/// Returns `(first, last)` period labels of a sorted series.
pub fn period_span(series: &[SeriesPoint]) -> Option<(&str, &str)> {
    match (series.first(), series.last()) {
        (Some(first), Some(last)) => Some((first.period.as_str(), last.period.as_str())),
        _ => None,
    }
}

/// Inclusive range of periods requested from the remote source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    start: i32,
    end: i32,
}

impl PeriodWindow {
    /// Create a window, rejecting `start > end`.
    pub fn new(start: i32, end: i32) -> Result<Self> {
        if start > end {
            return Err(AppError::validation(format!(
                "period window start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    /// Query-string form used by the World Bank API (`2000:2025`).
    pub fn as_query(&self) -> String {
        format!("{}:{}", self.start, self.end)
    }
}

impl fmt::Display for PeriodWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}–{}", self.start, self.end)
    }
}

/// Rounding rule for fetched values.
///
/// The two rules disagree on values such as `1.005`, whose shortest decimal
/// form sits on a midpoint while the underlying binary value lies just below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Half away from zero on the shortest decimal representation:
    /// `1.005 -> 1.01`.
    #[default]
    HalfUp,

    /// Ties-to-even on the exact binary value, as Python's `round()`:
    /// `1.005 -> 1.0`.
    HalfEven,
}

impl Rounding {
    /// Round `value` to `precision` decimal places.
    pub fn apply(self, value: f64, precision: u32) -> f64 {
        if !value.is_finite() {
            return value;
        }
        match self {
            Rounding::HalfUp => round_half_up(value, precision),
            Rounding::HalfEven => format!("{:.*}", precision as usize, value)
                .parse()
                .unwrap_or(value),
        }
    }
}

/// Round half away from zero on the decimal digits `Display` produces.
fn round_half_up(value: f64, precision: u32) -> f64 {
    let precision = precision as usize;
    let text = value.abs().to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    if frac_part.len() <= precision {
        return value;
    }

    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(precision))
        .collect();

    if frac_part.as_bytes()[precision] >= b'5' {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, b'1');
        }
    }

    let split = digits.len() - precision;
    let mut rounded = String::with_capacity(digits.len() + 2);
    if value.is_sign_negative() {
        rounded.push('-');
    }
    rounded.extend(digits[..split].iter().map(|&b| b as char));
    if precision > 0 {
        rounded.push('.');
        rounded.extend(digits[split..].iter().map(|&b| b as char));
    }
    rounded.parse().unwrap_or(value)
}
