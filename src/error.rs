// src/error.rs

//! Unified error handling for the pipeline.
//!
//! Remote fetch problems are deliberately absent here: the fetch client
//! degrades them into a tagged [`FetchOutcome`](crate::models::FetchOutcome)
//! instead of failing the run.

use std::fmt;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be constructed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Writing an artifact failed
    #[error("Publish error for {path}: {message}")]
    Publish { path: String, message: String },

    /// Schema or cross-file checks rejected a run
    #[error(
        "Verification failed for {context}: {schema} schema violation(s), {invariants} invariant failure(s)"
    )]
    Verification {
        context: String,
        schema: usize,
        invariants: usize,
    },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a publish error for a relative artifact path.
    pub fn publish(path: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Publish {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
