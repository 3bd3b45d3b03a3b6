//! Timing instrumentation for the search pipeline.
//!
//! Timings are summed across workers, so on a parallel run they add up to
//! more than the wall clock time.

use serde::Serialize;
use std::time::Duration;

/// Accumulated time spent in the two stages of searching a scan.
#[derive(Debug, Default, Clone, Copy)]
pub struct SearchTimings {
    /// Filtering peaks and accumulating fragment hits into the score vector.
    pub scoring: Duration,

    /// Picking the best candidate for every search mode.
    pub selection: Duration,
}

impl Serialize for SearchTimings {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("SearchTimings", 2)?;
        state.serialize_field("scoring_ms", &self.scoring.as_millis())?;
        state.serialize_field("selection_ms", &self.selection.as_millis())?;
        state.end()
    }
}

impl std::ops::AddAssign for SearchTimings {
    fn add_assign(&mut self, rhs: Self) {
        self.scoring += rhs.scoring;
        self.selection += rhs.selection;
    }
}
