// src/invariants/series.rs

//! Invariants between an indicator domain's `indicators.json` and
//! `summary.json`.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::ArtifactSet;
use crate::transform::{IndicatorsArtifact, SummaryArtifact};

use super::{Invariant, InvariantSet, Tolerance, compare};

const INDICATORS: &str = "indicators.json";
const SUMMARY: &str = "summary.json";

fn decode_pair(artifacts: &ArtifactSet) -> Result<(IndicatorsArtifact, SummaryArtifact), Vec<String>> {
    let indicators = artifacts.decode::<IndicatorsArtifact>(INDICATORS);
    let summary = artifacts.decode::<SummaryArtifact>(SUMMARY);
    match (indicators, summary) {
        (Ok(indicators), Ok(summary)) => Ok((indicators, summary)),
        (indicators, summary) => Err(indicators.err().into_iter().chain(summary.err()).collect()),
    }
}

/// Each summary entry reports the last point of its series.
pub struct LatestMatchesSeries;

impl Invariant for LatestMatchesSeries {
    fn name(&self) -> &str {
        "summary latest == last series point"
    }

    fn check(&self, artifacts: &ArtifactSet) -> Vec<String> {
        let (indicators, summary) = match decode_pair(artifacts) {
            Ok(pair) => pair,
            Err(errors) => return errors,
        };

        let series: BTreeMap<&str, _> = indicators
            .indicators
            .iter()
            .map(|i| (i.key.as_str(), &i.series))
            .collect();

        let mut errors = Vec::new();
        for entry in &summary.latest {
            // Key-set drift is reported by SameIndicatorKeys
            let Some(points) = series.get(entry.key.as_str()) else {
                continue;
            };

            match (points.last(), entry.value) {
                (None, None) => {}
                (None, Some(value)) => errors.push(format!(
                    "'{}': summary reports {} but the series is empty",
                    entry.key,
                    super::amount(value)
                )),
                (Some(last), None) => errors.push(format!(
                    "'{}': summary has no latest value but the series ends at {}",
                    entry.key, last.period
                )),
                (Some(last), Some(value)) => {
                    if entry.year.as_deref() != Some(last.period.as_str()) {
                        errors.push(format!(
                            "'{}': summary year {} != last series year {}",
                            entry.key,
                            entry.year.as_deref().unwrap_or("null"),
                            last.period
                        ));
                    }
                    errors.extend(compare(
                        &format!("'{}' latest value", entry.key),
                        value,
                        last.value,
                        Tolerance::Absolute(0.0),
                    ));
                }
            }

            if entry.points != points.len() {
                errors.push(format!(
                    "'{}': summary counts {} points, series has {}",
                    entry.key,
                    entry.points,
                    points.len()
                ));
            }
        }
        errors
    }
}

/// Both files describe the same indicator keys.
pub struct SameIndicatorKeys;

impl Invariant for SameIndicatorKeys {
    fn name(&self) -> &str {
        "indicators.json and summary.json keys match"
    }

    fn check(&self, artifacts: &ArtifactSet) -> Vec<String> {
        let (indicators, summary) = match decode_pair(artifacts) {
            Ok(pair) => pair,
            Err(errors) => return errors,
        };

        let left: BTreeSet<&str> = indicators.indicators.iter().map(|i| i.key.as_str()).collect();
        let right: BTreeSet<&str> = summary.latest.iter().map(|l| l.key.as_str()).collect();

        let mut errors = Vec::new();
        for key in left.difference(&right) {
            errors.push(format!("'{key}' is in {INDICATORS} but missing from {SUMMARY}"));
        }
        for key in right.difference(&left) {
            errors.push(format!("'{key}' is in {SUMMARY} but missing from {INDICATORS}"));
        }
        errors
    }
}

/// Checks run after every indicator-domain build.
pub fn indicator_invariants() -> InvariantSet {
    InvariantSet::new()
        .with(LatestMatchesSeries)
        .with(SameIndicatorKeys)
}
