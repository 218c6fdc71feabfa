// src/pipeline/run.rs

//! Domain pipeline: fetch → transform → validate → invariants → publish.

use std::collections::BTreeMap;

use crate::error::{AppError, Result};
use crate::models::{ArtifactSet, BatchFetch};
use crate::schema::SchemaViolation;
use crate::services::{IndicatorClient, fetch_multiple};
use crate::storage::{ArtifactStore, PublishedFile};
use crate::utils::log;

use super::Domain;

const STAGES: usize = 5;

/// Options for a domain run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Run every check but write nothing
    pub dry_run: bool,
}

/// Findings of the schema and invariant stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Verification {
    pub schema: Vec<SchemaViolation>,
    pub invariants: Vec<String>,
}

impl Verification {
    pub fn is_ok(&self) -> bool {
        self.schema.is_empty() && self.invariants.is_empty()
    }

    /// Turn findings into [`AppError::Verification`].
    pub fn into_result(self, context: &str) -> Result<Self> {
        if self.is_ok() {
            return Ok(self);
        }
        Err(AppError::Verification {
            context: context.to_string(),
            schema: self.schema.len(),
            invariants: self.invariants.len(),
        })
    }
}

/// Outcome of a successful domain run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub domain: String,
    pub year_label: String,
    pub fetch: BatchFetch,
    pub artifacts: usize,
    /// Empty on a dry run
    pub published: Vec<PublishedFile>,
}

impl RunReport {
    pub fn changed_files(&self) -> usize {
        self.published.iter().filter(|f| f.changed).count()
    }
}

/// Schema-check every artifact.
///
/// Nothing short-circuits: a single call surfaces every violation in the set.
pub fn check_schemas(artifacts: &ArtifactSet) -> Vec<SchemaViolation> {
    let mut schema = Vec::new();
    for artifact in artifacts.iter() {
        let violations = artifact.validate();
        if violations.is_empty() {
            log::sub_item(&format!("{} ✓", artifact.name));
        } else {
            for violation in &violations {
                log::failure(&violation.to_string());
            }
        }
        schema.extend(violations);
    }
    schema
}

/// Run one domain end to end.
///
/// Fails with [`AppError::Verification`] and publishes nothing when any
/// schema or invariant check fails.
pub async fn run_domain(
    domain: &dyn Domain,
    client: &IndicatorClient,
    store: &dyn ArtifactStore,
    options: &RunOptions,
) -> Result<RunReport> {
    log::header(&format!(
        "{} pipeline — {}",
        domain.name(),
        domain.year_label()
    ));

    log::step(1, STAGES, "FETCH");
    log::sub_item(&format!(
        "{} indicator(s) over {}",
        if domain.requested_keys().is_empty() {
            domain.indicators().len()
        } else {
            domain.requested_keys().len()
        },
        domain.window()
    ));
    let fetch = fetch_multiple(
        client,
        domain.indicators(),
        domain.requested_keys(),
        domain.window(),
        domain.precision(),
    )
    .await;
    for key in &fetch.unknown_keys {
        log::warn(&format!("Skipped unknown indicator key '{key}'"));
    }

    log::step(2, STAGES, "TRANSFORM");
    let artifacts = domain.build(&fetch.series)?;
    log::sub_item(&format!("{} artifact(s) built", artifacts.len()));

    log::step(3, STAGES, "VALIDATE");
    let schema = check_schemas(&artifacts);

    log::step(4, STAGES, "INVARIANTS");
    let invariants = domain.invariants().run_all(&artifacts);

    let verification = Verification { schema, invariants };
    if !verification.is_ok() {
        log::error(&format!(
            "Validation failed with {} error(s); nothing published",
            verification.schema.len() + verification.invariants.len()
        ));
    }
    verification.into_result(domain.name())?;

    let published = if options.dry_run {
        log::step(5, STAGES, "PUBLISH (skipped, dry run)");
        Vec::new()
    } else {
        log::step(5, STAGES, "PUBLISH");
        let outputs: BTreeMap<String, serde_json::Value> = artifacts
            .iter()
            .map(|a| (domain.artifact_path(&a.name), a.value.clone()))
            .collect();
        store.publish_all(&outputs).await?
    };

    let report = RunReport {
        domain: domain.name().to_string(),
        year_label: domain.year_label().to_string(),
        artifacts: artifacts.len(),
        fetch,
        published,
    };

    log::summary(
        &report.domain,
        &[
            ("Data points", report.fetch.total_points().to_string()),
            ("Fetch failures", report.fetch.failures.len().to_string()),
            ("Artifacts", report.artifacts.to_string()),
            ("Published", report.published.len().to_string()),
            ("Changed", report.changed_files().to_string()),
        ],
    );
    log::success(&format!("{} pipeline complete", report.domain));

    Ok(report)
}
