//! Scan search pipeline.
//!
//! Searching a scan has two stages:
//!
//! 1. **Scoring**: the [`SpectrumScorer`] fills a score vector with one entry
//!    per candidate.
//! 2. **Selection**: the [`ModeSelector`] picks the best accepted candidate
//!    for every search mode.
//!
//! The score vector is as long as the candidate list, so it is never
//! allocated per scan. [`SearchEngine::process_scan`] takes a mutable
//! [`ScoringBuffer`] and [`SearchEngine::process_batch`] uses rayon's
//! `map_init` to hand one buffer to each worker, which reuses it for all the
//! scans it gets.

use super::accumulator::SearchAccumulator;
use super::scorer::{
    DEFAULT_MAX_PEAKS,
    MassTolerance,
    ScoringBuffer,
    SpectrumScorer,
};
use super::search_mode::{
    MassDiffAcceptor,
    SearchMode,
    validate_search_modes,
};
use super::search_results::{
    MatchResult,
    SearchResults,
};
use super::selector::ModeSelector;
use super::timings::SearchTimings;
use crate::errors::{
    ConfigurationError,
    DataProcessingError,
    Result,
};
use crate::indexing::FragmentIndex;
use crate::models::{
    Candidate,
    Ms2Scan,
};
use rayon::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};
use std::time::Instant;
use tracing::{
    debug,
    info,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchParameters {
    pub fragment_tolerance: MassTolerance,
    /// Peaks kept per scan, the most intense ones.
    pub max_peaks: usize,
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            fragment_tolerance: MassTolerance::default(),
            max_peaks: DEFAULT_MAX_PEAKS,
        }
    }
}

impl SearchParameters {
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        if !self.fragment_tolerance.is_valid() {
            return Err(ConfigurationError::InvalidParameter {
                field: "fragment_tolerance",
                reason: format!("{:?} is not a non-negative tolerance", self.fragment_tolerance),
            });
        }
        if self.max_peaks == 0 {
            return Err(ConfigurationError::InvalidParameter {
                field: "max_peaks",
                reason: "at least one peak per scan is needed".to_string(),
            });
        }
        Ok(())
    }
}

/// Searches scans against a built index under several search modes.
pub struct SearchEngine<'a> {
    candidates: &'a [Candidate],
    modes: &'a [SearchMode],
    scorer: SpectrumScorer<'a>,
}

impl<'a> SearchEngine<'a> {
    pub fn new(
        candidates: &'a [Candidate],
        index: &'a FragmentIndex,
        modes: &'a [SearchMode],
        params: &SearchParameters,
    ) -> Result<Self> {
        if candidates.is_empty() {
            return Err(ConfigurationError::EmptyInput {
                context: "no candidates to search against",
            }
            .into());
        }
        validate_search_modes(modes)?;
        params.validate()?;
        if let Some(max_id) = index.max_candidate_id() {
            if max_id as usize >= candidates.len() {
                return Err(DataProcessingError::ExpectedSlicesSameLength {
                    expected: candidates.len(),
                    other: max_id as usize + 1,
                    context: "fragment index refers to more candidates than given".to_string(),
                }
                .into());
            }
        }

        Ok(Self {
            candidates,
            modes,
            scorer: SpectrumScorer::new(index, params.fragment_tolerance, params.max_peaks),
        })
    }

    pub fn new_buffer(&self) -> ScoringBuffer {
        ScoringBuffer::new(self.candidates.len())
    }

    /// Searches a single scan, one optional match per search mode.
    pub fn process_scan(
        &self,
        scan: &Ms2Scan,
        buffer: &mut ScoringBuffer,
        timings: &mut SearchTimings,
    ) -> Vec<Option<MatchResult>> {
        let st = Instant::now();
        let used = self.scorer.score(scan, buffer);
        timings.scoring += st.elapsed();
        if used == 0 {
            debug!("Scan {} has no usable peaks", scan.scan_id);
        }

        let st = Instant::now();
        let out = ModeSelector::new(self.candidates, self.modes).select(scan, &buffer.scores);
        timings.selection += st.elapsed();
        out
    }

    #[cfg_attr(
        feature = "instrumentation",
        tracing::instrument(skip_all, level = "trace")
    )]
    pub fn process_batch(&self, scans: &[Ms2Scan]) -> Result<SearchResults> {
        if scans.is_empty() {
            return Err(ConfigurationError::EmptyInput {
                context: "no scans to search",
            }
            .into());
        }
        let num_scans = scans.len();
        let search_start = Instant::now();

        #[cfg(not(feature = "serial_scoring"))]
        let results: SearchAccumulator = {
            scans
                .par_iter()
                .enumerate()
                .with_min_len(16)
                .map_init(
                    || self.new_buffer(),
                    |buffer, (i, scan)| {
                        let mut timings = SearchTimings::default();
                        let matches = self.process_scan(scan, buffer, &mut timings);
                        (i, matches, timings)
                    },
                )
                .collect()
        };

        #[cfg(feature = "serial_scoring")]
        let results: SearchAccumulator = {
            let mut buffer = self.new_buffer();
            scans
                .iter()
                .enumerate()
                .map(|(i, scan)| {
                    let mut timings = SearchTimings::default();
                    let matches = self.process_scan(scan, &mut buffer, &mut timings);
                    (i, matches, timings)
                })
                .collect()
        };

        let elapsed = search_start.elapsed();
        let avg_speed = std::time::Duration::from_nanos(elapsed.as_nanos() as u64 / num_scans as u64);
        let throughput = num_scans as f64 / elapsed.as_secs_f64();
        info!(
            "Searching {} scans against {} candidates took: {:?} throughput: {:#.1}/s, avg: {:?}",
            num_scans,
            self.candidates.len(),
            elapsed,
            throughput,
            avg_speed
        );

        let (per_mode, timings) = results.into_per_mode(self.modes.len(), num_scans);
        info!("{:?}", timings);

        let out = SearchResults {
            per_mode,
            mode_keys: self.modes.iter().map(|x| x.file_key().to_string()).collect(),
            timings,
        };
        for (key, count) in out.mode_keys.iter().zip(out.match_counts()) {
            info!("Search mode {}: {} of {} scans matched", key, count, num_scans);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FragSeekError;
    use crate::indexing::FragmentIndexBuilder;
    use crate::models::VarModSlot;

    #[test]
    fn test_engine_rejects_empty_inputs() {
        let index = FragmentIndex::default();
        let modes = vec![SearchMode::open()];
        let params = SearchParameters::default();
        assert!(matches!(
            SearchEngine::new(&[], &index, &modes, &params),
            Err(FragSeekError::Configuration(ConfigurationError::EmptyInput { .. }))
        ));

        let candidates = vec![Candidate {
            protein_index: 0,
            start: 0,
            length: 4,
            decoy: false,
            monoisotopic_mass: 400.0,
            var_mods: [VarModSlot::default(); 3],
        }];
        assert!(SearchEngine::new(&candidates, &index, &[], &params).is_err());
        let engine = SearchEngine::new(&candidates, &index, &modes, &params).unwrap();
        assert!(engine.process_batch(&[]).is_err());
    }

    #[test]
    fn test_engine_rejects_foreign_index() {
        let mut builder = FragmentIndexBuilder::new();
        builder.insert(100.0, 5);
        let index = builder.build();
        let candidates = vec![Candidate {
            protein_index: 0,
            start: 0,
            length: 4,
            decoy: false,
            monoisotopic_mass: 400.0,
            var_mods: [VarModSlot::default(); 3],
        }];
        let modes = vec![SearchMode::open()];
        let res = SearchEngine::new(&candidates, &index, &modes, &SearchParameters::default());
        assert!(matches!(res, Err(FragSeekError::DataProcessing(_))));
    }
}
