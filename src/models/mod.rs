// src/models/mod.rs

//! Domain models for the pipeline.
//!
//! This module contains the data structures passed between stages,
//! organized by their primary purpose.

mod artifact;
mod config;
mod fetch;
mod series;

// Re-export all public types
pub use artifact::{Artifact, ArtifactSet};
pub use config::{Config, DomainConfig, FetchConfig, LoggingConfig, PathsConfig};
pub use fetch::{BatchFetch, FetchFailure, FetchOutcome, FetchResultMap, IndicatorFetch, IndicatorMap};
pub use series::{PeriodWindow, Rounding, SeriesPoint, TimeSeries, period_span};
