// src/services/mod.rs

//! Remote data access: the source seam, the retrying fetch client, and the
//! batch orchestrator built on top of it.

mod batch;
mod client;
pub mod source;

pub use batch::fetch_multiple;
pub use client::{IndicatorClient, RetryPolicy, parse_envelope};
pub use source::{IndicatorSource, SourceError, WorldBankSource};
