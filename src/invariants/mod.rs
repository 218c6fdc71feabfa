// src/invariants/mod.rs

//! Cross-file consistency checks.
//!
//! Schema validation sees one file at a time. The checks here relate numbers
//! across artifacts (a treemap against the total it breaks down, a summary
//! against the series it summarizes). Every check returns its failures as
//! messages; an empty list means it passed.

pub mod budget;
pub mod series;

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::models::ArtifactSet;
use crate::utils::log;

/// How far a computed value may drift from the value it is checked against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    /// `|actual - expected| <= t`
    Absolute(f64),
    /// `|actual - expected| / |expected| * 100 <= percent`; an expected value
    /// of zero only admits zero
    Relative { percent: f64 },
}

impl Tolerance {
    /// Both bounds are inclusive.
    pub fn allows(&self, actual: f64, expected: f64) -> bool {
        let diff = (actual - expected).abs();
        match *self {
            Tolerance::Absolute(t) => diff <= t,
            Tolerance::Relative { percent } => {
                if expected == 0.0 {
                    actual == 0.0
                } else {
                    diff * 100.0 / expected.abs() <= percent
                }
            }
        }
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tolerance::Absolute(t) => write!(f, "±{}", amount(*t)),
            Tolerance::Relative { percent } => write!(f, "±{}%", amount(*percent)),
        }
    }
}

/// Render a number without float noise: at most four decimals, trailing
/// zeros trimmed.
pub fn amount(value: f64) -> String {
    let text = format!("{value:.4}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

fn mismatch(label: &str, actual: f64, expected: f64, tolerance: Tolerance) -> String {
    let diff = (actual - expected).abs();
    let relative = match tolerance {
        Tolerance::Relative { .. } if expected != 0.0 => {
            format!(" ({}%)", amount(diff * 100.0 / expected.abs()))
        }
        _ => String::new(),
    };
    format!(
        "{label}: {} != {}, diff = {}{relative} exceeds {tolerance}",
        amount(actual),
        amount(expected),
        amount(diff),
    )
}

fn compare(label: &str, actual: f64, expected: f64, tolerance: Tolerance) -> Vec<String> {
    if tolerance.allows(actual, expected) {
        Vec::new()
    } else {
        vec![mismatch(label, actual, expected, tolerance)]
    }
}

/// Leaf values must add up to a reported total.
pub fn check_leaf_sum(label: &str, leaves: &[f64], total: f64, tolerance: Tolerance) -> Vec<String> {
    compare(label, leaves.iter().sum(), total, tolerance)
}

/// Node of a hierarchical breakdown. Interior nodes carry `children`; leaves
/// carry `value`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TreeNode {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    pub fn leaf(value: f64) -> Self {
        Self {
            value: Some(value),
            children: None,
        }
    }

    pub fn branch(children: Vec<TreeNode>) -> Self {
        Self {
            value: None,
            children: Some(children),
        }
    }

    /// Sum of leaf values; a leaf without a value counts as zero.
    pub fn leaf_sum(&self) -> f64 {
        match &self.children {
            Some(children) if !children.is_empty() => children.iter().map(Self::leaf_sum).sum(),
            _ => self.value.unwrap_or(0.0),
        }
    }
}

/// Leaves of a tree must add up to a reported total.
pub fn check_tree_total(label: &str, root: &TreeNode, total: f64, tolerance: Tolerance) -> Vec<String> {
    compare(label, root.leaf_sum(), total, tolerance)
}

/// Each `(id, amount)` must match the amount recorded for the same id in
/// `reference`. Ids the reference does not know are not checked.
pub fn check_matching_amounts<'a>(
    label: &str,
    amounts: impl IntoIterator<Item = (&'a str, f64)>,
    reference: &BTreeMap<String, f64>,
    tolerance: Tolerance,
) -> Vec<String> {
    amounts
        .into_iter()
        .filter_map(|(id, actual)| {
            let expected = *reference.get(id)?;
            (!tolerance.allows(actual, expected))
                .then(|| mismatch(&format!("{label} '{id}'"), actual, expected, tolerance))
        })
        .collect()
}

/// Percentage shares must add up to 100.
pub fn check_percent_sum(label: &str, percents: &[f64], tolerance: Tolerance) -> Vec<String> {
    compare(label, percents.iter().sum(), 100.0, tolerance)
}

/// Regional amounts must add up to a national total. The tolerance is
/// usually relative since totals run to trillions.
pub fn check_regional_total(
    label: &str,
    regions: &[f64],
    total: f64,
    tolerance: Tolerance,
) -> Vec<String> {
    compare(label, regions.iter().sum(), total, tolerance)
}

/// A named check over all artifacts of one run.
pub trait Invariant {
    fn name(&self) -> &str;

    /// Failure messages; empty when the invariant holds.
    fn check(&self, artifacts: &ArtifactSet) -> Vec<String>;
}

/// Ordered collection of invariants run together.
#[derive(Default)]
pub struct InvariantSet {
    checks: Vec<Box<dyn Invariant>>,
}

impl InvariantSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, invariant: impl Invariant + 'static) -> Self {
        self.checks.push(Box::new(invariant));
        self
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every check and concatenate their failures.
    pub fn run_all(&self, artifacts: &ArtifactSet) -> Vec<String> {
        let mut errors = Vec::new();
        for invariant in &self.checks {
            let failures = invariant.check(artifacts);
            if failures.is_empty() {
                log::sub_item(&format!("{} ✓", invariant.name()));
            } else {
                for failure in &failures {
                    log::failure(&format!("{}: {failure}", invariant.name()));
                }
            }
            errors.extend(failures);
        }
        errors
    }
}
