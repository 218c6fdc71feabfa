// src/transform/mod.rs

//! Domain transforms: fetched series in, shaped artifacts out.
//!
//! Transforms are pure. Anything time-dependent, like the `lastUpdated`
//! stamp, is injected so that the same input always yields the same output.

mod indicators;

pub use indicators::{
    IndicatorSeries, IndicatorsArtifact, LatestValue, SummaryArtifact, build_indicators,
    build_summary, yoy_change,
};

use chrono::{Local, NaiveDate};

use crate::error::Result;
use crate::invariants::{self, InvariantSet};
use crate::models::{
    Artifact, ArtifactSet, DomainConfig, FetchResultMap, IndicatorMap, PeriodWindow, Rounding,
};
use crate::pipeline::Domain;
use crate::schema::catalog;

/// A configured indicator domain publishing `indicators.json` and
/// `summary.json`.
#[derive(Debug, Clone)]
pub struct IndicatorDomain {
    config: DomainConfig,
    window: PeriodWindow,
    rounding: Rounding,
    as_of: NaiveDate,
}

impl IndicatorDomain {
    /// Stamped with today's local date.
    pub fn new(config: DomainConfig, rounding: Rounding) -> Result<Self> {
        let window = config.window()?;
        Ok(Self {
            config,
            window,
            rounding,
            as_of: Local::now().date_naive(),
        })
    }

    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = as_of;
        self
    }
}

impl Domain for IndicatorDomain {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn year_label(&self) -> &str {
        &self.config.year_label
    }

    fn indicators(&self) -> &IndicatorMap {
        &self.config.indicators
    }

    fn requested_keys(&self) -> &[String] {
        &self.config.keys
    }

    fn window(&self) -> PeriodWindow {
        self.window
    }

    fn precision(&self) -> u32 {
        self.config.precision
    }

    fn build(&self, data: &FetchResultMap) -> Result<ArtifactSet> {
        let indicators = build_indicators(&self.config, data);
        let summary = build_summary(&self.config, data, self.as_of, self.rounding);

        Ok(ArtifactSet::new(vec![
            Artifact::from_record("indicators.json", catalog::indicators(), &indicators)?,
            Artifact::from_record("summary.json", catalog::summary(), &summary)?,
        ]))
    }

    fn invariants(&self) -> InvariantSet {
        invariants::series::indicator_invariants()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Config, SeriesPoint};

    fn domain() -> IndicatorDomain {
        let config = Config::default().domain("census").cloned().unwrap();
        IndicatorDomain::new(config, Rounding::HalfUp)
            .unwrap()
            .with_as_of(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap())
    }

    #[test]
    fn test_build_is_deterministic_and_valid() {
        let data: FetchResultMap = [(
            "population".to_string(),
            vec![SeriesPoint::new("2023", 1.0), SeriesPoint::new("2024", 2.0)],
        )]
        .into();

        let domain = domain();
        let first = domain.build(&data).unwrap();
        let second = domain.build(&data).unwrap();

        assert_eq!(first.len(), 2);
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.value, b.value);
            assert!(a.validate().is_empty(), "{:?}", a.validate());
        }
        assert!(domain.invariants().run_all(&first).is_empty());
    }

    #[test]
    fn test_empty_fetch_still_builds_every_key() {
        let domain = domain();
        let artifacts = domain.build(&FetchResultMap::new()).unwrap();
        let indicators: IndicatorsArtifact = artifacts.decode("indicators.json").unwrap();
        assert_eq!(indicators.indicators.len(), domain.indicators().len());
        assert!(domain.invariants().run_all(&artifacts).is_empty());
    }

    #[test]
    fn test_economy_publishes_only_requested_keys() {
        let config = Config::default().domain("economy").cloned().unwrap();
        let requested = config.keys.clone();
        let domain = IndicatorDomain::new(config, Rounding::HalfUp).unwrap();

        let data: FetchResultMap = requested
            .iter()
            .map(|key| (key.clone(), vec![SeriesPoint::new("2024", 1.0)]))
            .collect();
        let artifacts = domain.build(&data).unwrap();

        let indicators: IndicatorsArtifact = artifacts.decode("indicators.json").unwrap();
        let summary: SummaryArtifact = artifacts.decode("summary.json").unwrap();
        assert_eq!(indicators.indicators.len(), requested.len());
        assert!(indicators.indicators.iter().all(|i| requested.contains(&i.key)));
        assert!(indicators.indicators.iter().all(|i| !i.series.is_empty()));
        assert_eq!(summary.latest.len(), requested.len());
        assert!(domain.invariants().run_all(&artifacts).is_empty());
    }

    #[test]
    fn test_rejects_inverted_window() {
        let mut config = Config::default().domains[0].clone();
        config.start_year = 2030;
        assert!(IndicatorDomain::new(config, Rounding::HalfUp).is_err());
    }
}
