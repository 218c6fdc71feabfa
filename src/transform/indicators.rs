// src/transform/indicators.rs

//! Output records of an indicator domain.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{DomainConfig, FetchResultMap, Rounding, SeriesPoint, TimeSeries};

/// `indicators.json`: every indicator's full series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorsArtifact {
    pub year: String,
    pub domain: String,
    pub source: String,
    pub indicators: Vec<IndicatorSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSeries {
    pub key: String,
    pub code: String,
    pub series: TimeSeries,
}

/// `summary.json`: latest observation of every indicator, for hub cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryArtifact {
    pub year: String,
    pub domain: String,
    pub source: String,
    pub last_updated: String,
    pub latest: Vec<LatestValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestValue {
    pub key: String,
    pub code: String,
    /// Length of the full series
    pub points: usize,
    /// Period of the latest point
    pub year: Option<String>,
    pub value: Option<f64>,
    pub previous_value: Option<f64>,
    pub yoy_change: Option<f64>,
}

impl LatestValue {
    fn from_series(key: &str, code: &str, series: &[SeriesPoint], rounding: Rounding) -> Self {
        let latest = series.last();
        let previous = series.len().checked_sub(2).and_then(|i| series.get(i));

        Self {
            key: key.to_string(),
            code: code.to_string(),
            points: series.len(),
            year: latest.map(|p| p.period.clone()),
            value: latest.map(|p| p.value),
            previous_value: previous.map(|p| p.value),
            yoy_change: latest.and_then(|l| yoy_change(l.value, previous.map(|p| p.value), rounding)),
        }
    }
}

/// Percentage change from `previous` to `current` at one decimal place.
///
/// `None` without a previous value or when it is zero.
pub fn yoy_change(current: f64, previous: Option<f64>, rounding: Rounding) -> Option<f64> {
    match previous {
        Some(previous) if previous != 0.0 => {
            Some(rounding.apply((current - previous) / previous * 100.0, 1))
        }
        _ => None,
    }
}

/// Build `indicators.json` for a domain's selected indicators. Keys without
/// fetched data get an empty series.
pub fn build_indicators(config: &DomainConfig, data: &FetchResultMap) -> IndicatorsArtifact {
    IndicatorsArtifact {
        year: config.year_label.clone(),
        domain: config.name.clone(),
        source: config.source.clone(),
        indicators: config
            .selected_indicators()
            .map(|(key, code)| IndicatorSeries {
                key: key.clone(),
                code: code.clone(),
                series: data.get(key).cloned().unwrap_or_default(),
            })
            .collect(),
    }
}

/// Build `summary.json` for a domain as of `as_of`.
pub fn build_summary(
    config: &DomainConfig,
    data: &FetchResultMap,
    as_of: NaiveDate,
    rounding: Rounding,
) -> SummaryArtifact {
    SummaryArtifact {
        year: config.year_label.clone(),
        domain: config.name.clone(),
        source: config.source.clone(),
        last_updated: as_of.format("%Y-%m-%d").to_string(),
        latest: config
            .selected_indicators()
            .map(|(key, code)| {
                let series = data.get(key).map(Vec::as_slice).unwrap_or_default();
                LatestValue::from_series(key, code, series, rounding)
            })
            .collect(),
    }
}
