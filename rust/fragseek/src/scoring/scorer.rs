use crate::chemistry::PROTON;
use crate::indexing::FragmentIndex;
use crate::models::Ms2Scan;
use serde::{
    Deserialize,
    Serialize,
};

pub const DEFAULT_MAX_PEAKS: usize = 400;

/// A mass tolerance, either absolute (daltons) or relative (ppm).
///
/// Used to match observed fragment masses against index keys and by search
/// modes to size their precursor windows.
///
/// ```
/// use fragseek::scoring::MassTolerance;
///
/// let tol: MassTolerance = serde_json::from_str(r#"{"ppm": 10.0}"#).unwrap();
/// assert!(tol.within(1000.0, 1000.009));
/// assert!(!tol.within(1000.0, 1000.011));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MassTolerance {
    #[serde(rename = "da")]
    Absolute(f64),
    #[serde(rename = "ppm")]
    Ppm(f64),
}

impl Default for MassTolerance {
    fn default() -> Self {
        MassTolerance::Absolute(0.01)
    }
}

impl MassTolerance {
    /// Half width of the window around `mass`, in daltons.
    pub fn width_at(&self, mass: f64) -> f64 {
        match self {
            MassTolerance::Absolute(da) => *da,
            MassTolerance::Ppm(ppm) => mass.abs() * ppm * 1e-6,
        }
    }

    /// Strictly inside the window around `observed`.
    pub fn within(&self, theoretical: f64, observed: f64) -> bool {
        (theoretical - observed).abs() < self.width_at(observed)
    }

    pub fn is_valid(&self) -> bool {
        let x = match self {
            MassTolerance::Absolute(x) => x,
            MassTolerance::Ppm(x) => x,
        };
        x.is_finite() && *x >= 0.0
    }
}

/// Per worker scratch space for scoring.
///
/// Holds one score per candidate, reset at the start of every scan, and a
/// scratch vector for the peak filter.
#[derive(Debug, Clone)]
pub struct ScoringBuffer {
    pub scores: Vec<f32>,
    intensities: Vec<f32>,
}

impl ScoringBuffer {
    pub fn new(num_candidates: usize) -> Self {
        Self {
            scores: vec![0.0; num_candidates],
            intensities: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.scores.iter_mut().for_each(|x| *x = 0.0);
    }
}

/// Approximately median-unbiased sample quantile of sorted `values`
/// (Hyndman and Fan "type 8").
fn quantile_sorted(values: &[f32], q: f64) -> f32 {
    let n = values.len() as f64;
    let q = q.clamp(0.0, 1.0);
    if q < (2.0 / 3.0) / (n + 1.0 / 3.0) {
        return values[0];
    }
    if q >= (n - 1.0 / 3.0) / (n + 1.0 / 3.0) {
        return values[values.len() - 1];
    }
    // One-based position, within [1, n) after the checks above.
    let h = (n + 1.0 / 3.0) * q + 1.0 / 3.0;
    let lo = (h.floor() as usize).clamp(1, values.len()) - 1;
    let hi = (lo + 1).min(values.len() - 1);
    let frac = (h - h.floor()) as f32;
    values[lo] + frac * (values[hi] - values[lo])
}

/// Scores a scan against every candidate in a [`FragmentIndex`].
///
/// Each retained peak adds `1 + intensity / TIC` to every candidate that has
/// a fragment key within tolerance of the peak's neutral mass.
#[derive(Debug, Clone, Copy)]
pub struct SpectrumScorer<'a> {
    pub index: &'a FragmentIndex,
    pub tolerance: MassTolerance,
    pub max_peaks: usize,
}

impl<'a> SpectrumScorer<'a> {
    pub fn new(index: &'a FragmentIndex, tolerance: MassTolerance, max_peaks: usize) -> Self {
        Self {
            index,
            tolerance,
            max_peaks,
        }
    }

    /// Intensity a peak has to exceed to be used. `None` if every peak is used.
    fn intensity_cutoff(&self, scan: &Ms2Scan, buffer: &mut ScoringBuffer) -> Option<f32> {
        let n = scan.num_peaks();
        if n <= self.max_peaks {
            return None;
        }
        buffer.intensities.clear();
        buffer.intensities.extend_from_slice(&scan.intensity);
        buffer.intensities.sort_unstable_by(|a, b| a.total_cmp(b));
        let q = 1.0 - self.max_peaks as f64 / n as f64;
        Some(quantile_sorted(&buffer.intensities, q))
    }

    /// Fills `buffer.scores` for `scan` and returns the number of peaks used.
    #[cfg_attr(
        feature = "instrumentation",
        tracing::instrument(skip_all, level = "trace")
    )]
    pub fn score(&self, scan: &Ms2Scan, buffer: &mut ScoringBuffer) -> usize {
        buffer.reset();
        let cutoff = self.intensity_cutoff(scan, buffer);
        let keys = self.index.keys_sorted();
        let tic = scan.total_ion_current;

        let mut used = 0;
        for (mz, intensity) in scan.mz.iter().zip(scan.intensity.iter()) {
            if let Some(cutoff) = cutoff {
                if *intensity <= cutoff {
                    continue;
                }
            }
            used += 1;

            let increment = if tic > 0.0 {
                (1.0 + *intensity as f64 / tic) as f32
            } else {
                1.0
            };
            let neutral_mass = mz - PROTON;
            let ipos = keys.partition_point(|k| *k < neutral_mass);

            for pos in (0..ipos).rev() {
                if !self.tolerance.within(keys[pos], neutral_mass) {
                    break;
                }
                self.add_hits(pos, increment, &mut buffer.scores);
            }
            for pos in ipos..keys.len() {
                if !self.tolerance.within(keys[pos], neutral_mass) {
                    break;
                }
                self.add_hits(pos, increment, &mut buffer.scores);
            }
        }
        used
    }

    #[inline]
    fn add_hits(&self, position: usize, increment: f32, scores: &mut [f32]) {
        for id in self.index.candidates_at(position) {
            if let Some(score) = scores.get_mut(*id as usize) {
                *score += increment;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexing::FragmentIndexBuilder;

    fn scan(mz: Vec<f64>, intensity: Vec<f32>) -> Ms2Scan {
        Ms2Scan::try_new(1, mz, intensity, 1000.0).unwrap()
    }

    #[test]
    fn test_binary_search_both_directions() {
        let mut builder = FragmentIndexBuilder::new();
        builder.insert(100.000, 0);
        builder.insert(100.002, 1);
        builder.insert(105.000, 2);
        let index = builder.build();

        let scorer = SpectrumScorer::new(&index, MassTolerance::Absolute(0.003), 400);
        let mut buffer = ScoringBuffer::new(3);
        let used = scorer.score(&scan(vec![100.001 + PROTON], vec![10.0]), &mut buffer);

        assert_eq!(used, 1);
        // TIC is the single peak, so every hit adds 1 + 1.
        assert_eq!(buffer.scores, vec![2.0, 2.0, 0.0]);
    }

    #[test]
    fn test_scores_reset_between_scans() {
        let mut builder = FragmentIndexBuilder::new();
        builder.insert(200.0, 0);
        let index = builder.build();
        let scorer = SpectrumScorer::new(&index, MassTolerance::Absolute(0.01), 400);
        let mut buffer = ScoringBuffer::new(1);

        scorer.score(&scan(vec![200.0 + PROTON], vec![1.0]), &mut buffer);
        assert!(buffer.scores[0] > 0.0);
        scorer.score(&scan(vec![300.0 + PROTON], vec![1.0]), &mut buffer);
        assert_eq!(buffer.scores[0], 0.0);
    }

    #[test]
    fn test_peak_filter_keeps_most_intense() {
        let mut builder = FragmentIndexBuilder::new();
        for (i, mass) in [100.0, 200.0, 300.0, 400.0, 500.0].iter().enumerate() {
            builder.insert(*mass, i as u32);
        }
        let index = builder.build();
        let scorer = SpectrumScorer::new(&index, MassTolerance::Absolute(0.01), 2);
        let mut buffer = ScoringBuffer::new(5);

        let mz = [100.0, 200.0, 300.0, 400.0, 500.0]
            .iter()
            .map(|x| x + PROTON)
            .collect();
        let used = scorer.score(&scan(mz, vec![1.0, 5.0, 3.0, 4.0, 2.0]), &mut buffer);

        // Quantile at 0.6 of [1, 2, 3, 4, 5] is 3.53
        assert_eq!(used, 2);
        assert_eq!(buffer.scores[0], 0.0);
        assert!(buffer.scores[1] > 0.0);
        assert_eq!(buffer.scores[2], 0.0);
        assert!(buffer.scores[3] > 0.0);
        assert_eq!(buffer.scores[4], 0.0);
    }

    #[test]
    fn test_zero_tic_adds_one() {
        let mut builder = FragmentIndexBuilder::new();
        builder.insert(150.0, 0);
        let index = builder.build();
        let scorer = SpectrumScorer::new(&index, MassTolerance::Ppm(20.0), 400);
        let mut buffer = ScoringBuffer::new(1);
        let scan = scan(vec![150.0 + PROTON], vec![3.0]).with_total_ion_current(0.0);
        scorer.score(&scan, &mut buffer);
        assert_eq!(buffer.scores[0], 1.0);
    }

    #[test]
    fn test_quantile_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile_sorted(&values, 0.0), 1.0);
        assert_eq!(quantile_sorted(&values, 1.0), 5.0);
        assert!((quantile_sorted(&values, 0.6) - 3.533_333).abs() < 1e-5);
        assert!((quantile_sorted(&values, 0.5) - 3.0).abs() < 1e-6);
        assert_eq!(quantile_sorted(&[7.0], 0.3), 7.0);
    }

    #[test]
    fn test_tolerance_edge_is_excluded() {
        let tol = MassTolerance::Absolute(0.5);
        assert!(!tol.within(100.0, 100.5));
        assert!(!tol.within(100.5, 100.0));
        assert!(tol.within(100.0, 100.25));

        let ppm = MassTolerance::Ppm(10.0);
        assert!(ppm.within(1000.0, 1000.0));
        assert!(!ppm.within(1000.0, 1000.02));
    }
}
