// src/models/artifact.rs

//! Output artifacts produced by a domain transform.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;
use crate::schema::{self, SchemaViolation, Shape};

/// One fully-shaped output file, paired with the shape it must satisfy.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// File name within the domain's output directory (e.g. `summary.json`)
    pub name: String,
    pub shape: Shape,
    pub value: Value,
}

impl Artifact {
    pub fn new(name: impl Into<String>, shape: Shape, value: Value) -> Self {
        Self {
            name: name.into(),
            shape,
            value,
        }
    }

    /// Build an artifact from any serializable record.
    pub fn from_record<T: Serialize>(name: impl Into<String>, shape: Shape, record: &T) -> Result<Self> {
        Ok(Self::new(name, shape, serde_json::to_value(record)?))
    }

    /// Check the value against its shape.
    pub fn validate(&self) -> Vec<SchemaViolation> {
        schema::validate(&self.name, &self.shape, &self.value)
    }
}

/// All artifacts of one run, in build order.
#[derive(Debug, Clone, Default)]
pub struct ArtifactSet {
    artifacts: Vec<Artifact>,
}

impl ArtifactSet {
    pub fn new(artifacts: Vec<Artifact>) -> Self {
        Self { artifacts }
    }

    pub fn get(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.name == name)
    }

    /// Decode an artifact into a typed view, or describe why that is impossible.
    ///
    /// The error side is a readable message so cross-file checks can report it
    /// alongside their own findings.
    pub fn decode<T: DeserializeOwned>(&self, name: &str) -> std::result::Result<T, String> {
        let artifact = self
            .get(name)
            .ok_or_else(|| format!("{name} is missing from this run"))?;
        T::deserialize(&artifact.value).map_err(|e| format!("{name} could not be decoded: {e}"))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Total {
        total: f64,
    }

    #[test]
    fn test_decode_reports_missing_artifact() {
        let set = ArtifactSet::default();
        let err = set.decode::<Total>("expenditure.json").unwrap_err();
        assert!(err.contains("expenditure.json is missing"));
    }

    #[test]
    fn test_decode_reads_typed_view() {
        let set = ArtifactSet::new(vec![Artifact::new(
            "expenditure.json",
            Shape::Any,
            json!({"total": 60.0, "year": "2025-26"}),
        )]);
        let total: Total = set.decode("expenditure.json").unwrap();
        assert_eq!(total.total, 60.0);
    }

    #[test]
    fn test_decode_reports_shape_mismatch() {
        let set = ArtifactSet::new(vec![Artifact::new(
            "expenditure.json",
            Shape::Any,
            json!({"total": "lots"}),
        )]);
        let err = set.decode::<Total>("expenditure.json").unwrap_err();
        assert!(err.contains("could not be decoded"));
    }
}
