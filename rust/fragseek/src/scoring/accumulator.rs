//! Collects per-scan results coming out of the parallel search.
//!
//! Every item carries the position of its scan in the input batch, so the
//! accumulated matches can be placed back in input order no matter in which
//! order the workers finish.

use super::search_results::MatchResult;
use super::timings::SearchTimings;
use rayon::iter::{
    FromParallelIterator,
    IntoParallelIterator,
    ParallelIterator,
};

/// One searched scan: its position in the batch, one optional match per mode
/// and the time it took.
pub(super) type ScanOutcome = (usize, Vec<Option<MatchResult>>, SearchTimings);

/// Fold-reduce accumulator for [`ScanOutcome`]s.
#[derive(Default)]
pub(super) struct SearchAccumulator {
    pub(super) res: Vec<(usize, Vec<Option<MatchResult>>)>,
    pub(super) timings: SearchTimings,
}

impl SearchAccumulator {
    pub(super) fn reduce(mut self, other: Self) -> Self {
        self.res.extend(other.res);
        self.timings += other.timings;
        self
    }

    pub(super) fn fold(mut self, item: ScanOutcome) -> Self {
        self.res.push((item.0, item.1));
        self.timings += item.2;
        self
    }

    /// Transposes the per-scan matches into `[mode][scan]`, in input order.
    pub(super) fn into_per_mode(
        mut self,
        num_modes: usize,
        num_scans: usize,
    ) -> (Vec<Vec<Option<MatchResult>>>, SearchTimings) {
        self.res.sort_unstable_by_key(|x| x.0);
        let mut per_mode: Vec<Vec<Option<MatchResult>>> = (0..num_modes)
            .map(|_| Vec::with_capacity(num_scans))
            .collect();
        for (_, matches) in self.res {
            for (mode_matches, m) in per_mode.iter_mut().zip(matches) {
                mode_matches.push(m);
            }
        }
        (per_mode, self.timings)
    }
}

impl FromIterator<ScanOutcome> for SearchAccumulator {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = ScanOutcome>,
    {
        iter.into_iter()
            .fold(SearchAccumulator::default(), SearchAccumulator::fold)
    }
}

impl FromParallelIterator<ScanOutcome> for SearchAccumulator {
    fn from_par_iter<I>(par_iter: I) -> Self
    where
        I: IntoParallelIterator<Item = ScanOutcome>,
    {
        par_iter
            .into_par_iter()
            .fold(SearchAccumulator::default, SearchAccumulator::fold)
            .reduce(SearchAccumulator::default, SearchAccumulator::reduce)
    }
}
