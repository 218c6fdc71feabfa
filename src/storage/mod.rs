//! Storage abstractions for published artifacts.
//!
//! Artifacts are addressed by a relative path such as
//! `census/2025-26/summary.json`:
//!
//! ```text
//! {root}/
//! ├── census/
//! │   └── 2025-26/
//! │       ├── indicators.json
//! │       └── summary.json
//! └── budget/
//!     └── 2025-26/
//!         ├── treemap.json
//!         └── ...
//! ```

pub mod local;

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStore;

/// Record of one written file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedFile {
    /// Absolute path written
    pub path: PathBuf,
    /// Size of the serialized JSON
    pub bytes: usize,
    /// Hex SHA-256 of the serialized JSON
    pub sha256: String,
    /// False when the file already held identical content
    pub changed: bool,
}

/// Trait for artifact storage backends.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write `value` as pretty JSON under `relative_path`, replacing any
    /// previous content.
    async fn publish(&self, relative_path: &str, value: &Value) -> Result<PublishedFile>;

    /// Read a previously published artifact, `None` if it does not exist.
    async fn load(&self, relative_path: &str) -> Result<Option<Value>>;

    /// Publish every entry in path order.
    ///
    /// Writes are independent: a failure leaves earlier files on disk.
    async fn publish_all(&self, outputs: &BTreeMap<String, Value>) -> Result<Vec<PublishedFile>> {
        let mut written = Vec::with_capacity(outputs.len());
        for (path, value) in outputs {
            written.push(self.publish(path, value).await?);
        }
        Ok(written)
    }
}
