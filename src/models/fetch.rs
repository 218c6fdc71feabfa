// src/models/fetch.rs

//! Outcomes of indicator fetches.
//!
//! A fetch never fails the run. Callers that only need data use
//! [`IndicatorFetch::into_series`]; callers that need to tell "no data"
//! apart from "source unreachable" match on [`FetchOutcome`].

use std::collections::BTreeMap;
use thiserror::Error;

use super::series::TimeSeries;

/// Friendly indicator key mapped to a remote indicator code.
pub type IndicatorMap = BTreeMap<String, String>;

/// Friendly indicator key mapped to its fetched series.
pub type FetchResultMap = BTreeMap<String, TimeSeries>;

/// Why a fetch produced no series.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// Empty indicator code; no request was issued
    #[error("empty indicator code")]
    InvalidCode,

    /// Source answered with a non-success HTTP status
    #[error("HTTP status {0}")]
    Status(u16),

    /// Source answered with something other than the two-part envelope
    #[error("unexpected response format: {0}")]
    Malformed(String),

    /// Every attempt hit a transient failure
    #[error("failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// Non-transient request failure
    #[error("request failed: {0}")]
    Request(String),
}

/// Result of a single indicator fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// At least one point survived null filtering
    Series(TimeSeries),
    /// Source confirmed there is nothing in the window
    NoData,
    /// Fetch gave up
    Failed(FetchFailure),
}

/// A completed fetch with its attempt count.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFetch {
    pub code: String,
    pub attempts: u32,
    pub outcome: FetchOutcome,
}

impl IndicatorFetch {
    /// Points fetched, empty for `NoData` and `Failed`.
    pub fn series(&self) -> &[super::SeriesPoint] {
        match &self.outcome {
            FetchOutcome::Series(points) => points,
            _ => &[],
        }
    }

    /// Collapse into a plain series, empty when nothing was fetched.
    pub fn into_series(self) -> TimeSeries {
        match self.outcome {
            FetchOutcome::Series(points) => points,
            _ => Vec::new(),
        }
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match &self.outcome {
            FetchOutcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Aggregate of a batch fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchFetch {
    /// One entry per requested key that exists in the indicator map
    pub series: FetchResultMap,
    /// Keys whose fetch failed (they still have an empty entry in `series`)
    pub failures: BTreeMap<String, FetchFailure>,
    /// Requested keys missing from the indicator map
    pub unknown_keys: Vec<String>,
}

impl BatchFetch {
    pub fn total_points(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }
}
