// src/pipeline/domain.rs

use crate::error::Result;
use crate::invariants::InvariantSet;
use crate::models::{ArtifactSet, FetchResultMap, IndicatorMap, PeriodWindow};

/// One publishable domain: what to fetch, how to shape it, what must hold.
pub trait Domain {
    /// Directory name under the output root.
    fn name(&self) -> &str;

    fn year_label(&self) -> &str;

    fn indicators(&self) -> &IndicatorMap;

    /// Keys to fetch; empty means every key in [`Domain::indicators`].
    fn requested_keys(&self) -> &[String];

    fn window(&self) -> PeriodWindow;

    fn precision(&self) -> u32;

    /// Shape fetched series into artifacts. Must be deterministic and free
    /// of I/O.
    fn build(&self, data: &FetchResultMap) -> Result<ArtifactSet>;

    fn invariants(&self) -> InvariantSet;

    /// Relative publish path of an artifact.
    fn artifact_path(&self, file: &str) -> String {
        format!("{}/{}/{}", self.name(), self.year_label(), file)
    }
}
