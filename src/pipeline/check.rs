// src/pipeline/check.rs

//! Re-check published union-budget artifacts.

use crate::error::Result;
use crate::invariants::budget::budget_invariants;
use crate::models::{Artifact, ArtifactSet};
use crate::schema::{SchemaViolation, catalog};
use crate::storage::ArtifactStore;
use crate::utils::log;

use super::{Verification, check_schemas};

/// Load `budget/{year}/*.json`, validate each file and run the budget
/// invariants across them.
///
/// Missing files are reported as violations rather than aborting, so one
/// call lists every problem.
pub async fn run_budget_check(store: &dyn ArtifactStore, year: &str) -> Result<Verification> {
    log::header(&format!("Union budget check — {year}"));

    let mut artifacts = Vec::new();
    let mut missing = Vec::new();
    for (file, shape) in catalog::budget() {
        let path = format!("budget/{year}/{file}");
        match store.load(&path).await? {
            Some(value) => artifacts.push(Artifact::new(file, shape, value)),
            None => {
                log::warn(&format!("{path} not found"));
                missing.push(SchemaViolation {
                    artifact: file.to_string(),
                    path: "root".into(),
                    message: format!("{path} has not been published"),
                });
            }
        }
    }

    let artifacts = ArtifactSet::new(artifacts);

    log::step(1, 2, "VALIDATE");
    let mut schema = missing;
    schema.extend(check_schemas(&artifacts));

    log::step(2, 2, "INVARIANTS");
    let invariants = budget_invariants().run_all(&artifacts);

    let verification = Verification { schema, invariants };

    let verification = verification.into_result(&format!("budget {year}"))?;
    log::success(&format!("budget {year}: {} file(s) consistent", artifacts.len()));
    Ok(verification)
}
