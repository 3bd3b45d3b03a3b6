//! Picks the best candidate of a scored scan for every search mode.
//!
//! Only candidates with a positive score are eligible. A candidate replaces
//! the current best of a mode when the mode accepts its mass difference and
//! either its score is strictly higher or it ties and
//! [`first_is_preferable`] favours it.

use super::search_mode::{
    MassDiffAcceptor,
    SearchMode,
};
use super::search_results::MatchResult;
use crate::models::{
    Candidate,
    Ms2Scan,
};

/// Mass difference that tie-breaks favour.
pub const ANCHOR_MASS_DIFFERENCE: f64 = 0.0;
/// A candidate strictly closer than this to [`ANCHOR_MASS_DIFFERENCE`] is
/// near the anchor, one strictly further away is far from it. Exactly at the
/// boundary it is neither.
pub const ANCHOR_TOLERANCE: f64 = 0.5;
/// Scores closer than this are ties.
pub const SCORE_TIE_TOLERANCE: f32 = 1e-6;

fn anchor_distance(mass_difference: f64) -> f64 {
    (mass_difference - ANCHOR_MASS_DIFFERENCE).abs()
}

/// Tie-break between two equally scored candidates.
///
/// A candidate near the anchor mass difference beats one that is not.
/// Otherwise the variable modification slots are compared in order, and the
/// first slot where one is empty and the other is not decides. Returns
/// `false` when nothing tells them apart.
pub fn first_is_preferable(
    first: &Candidate,
    first_mass_difference: f64,
    second: &Candidate,
    second_mass_difference: f64,
) -> bool {
    let first_distance = anchor_distance(first_mass_difference);
    let second_distance = anchor_distance(second_mass_difference);
    if first_distance < ANCHOR_TOLERANCE && second_distance > ANCHOR_TOLERANCE {
        return true;
    }
    if first_distance > ANCHOR_TOLERANCE && second_distance < ANCHOR_TOLERANCE {
        return false;
    }
    for (a, b) in first.var_mods.iter().zip(second.var_mods.iter()) {
        match (a.is_empty(), b.is_empty()) {
            (true, false) => return true,
            (false, true) => return false,
            _ => {}
        }
    }
    false
}

#[derive(Debug, Clone, Copy)]
struct Best {
    candidate_index: u32,
    score: f32,
    notch: usize,
    mass_difference: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ModeSelector<'a> {
    pub candidates: &'a [Candidate],
    pub modes: &'a [SearchMode],
}

impl<'a> ModeSelector<'a> {
    pub fn new(candidates: &'a [Candidate], modes: &'a [SearchMode]) -> Self {
        Self { candidates, modes }
    }

    /// One entry per mode, `None` where no candidate was accepted.
    #[cfg_attr(
        feature = "instrumentation",
        tracing::instrument(skip_all, level = "trace")
    )]
    pub fn select(&self, scan: &Ms2Scan, scores: &[f32]) -> Vec<Option<MatchResult>> {
        let mut best: Vec<Option<Best>> = vec![None; self.modes.len()];

        for (candidate_index, (candidate, score)) in
            self.candidates.iter().zip(scores.iter()).enumerate()
        {
            let score = *score;
            if score.is_nan() || score <= 0.0 {
                continue;
            }
            let candidate_mass = candidate.monoisotopic_mass as f64;
            let mass_difference = scan.precursor_mass - candidate_mass;

            for (mode, current) in self.modes.iter().zip(best.iter_mut()) {
                let Some(notch) = mode.notch(mass_difference, candidate_mass) else {
                    continue;
                };
                let replace = match current {
                    None => true,
                    Some(b) if score - b.score > SCORE_TIE_TOLERANCE => true,
                    Some(b) if (score - b.score).abs() < SCORE_TIE_TOLERANCE => {
                        first_is_preferable(
                            candidate,
                            mass_difference,
                            &self.candidates[b.candidate_index as usize],
                            b.mass_difference,
                        )
                    }
                    Some(_) => false,
                };
                if replace {
                    *current = Some(Best {
                        candidate_index: candidate_index as u32,
                        score,
                        notch,
                        mass_difference,
                    });
                }
            }
        }

        best.into_iter()
            .enumerate()
            .map(|(search_mode, b)| {
                b.map(|b| MatchResult {
                    scan_id: scan.scan_id,
                    candidate_index: b.candidate_index,
                    score: b.score,
                    search_mode,
                    notch: b.notch,
                    precursor_mass: scan.precursor_mass,
                    mass_difference: b.mass_difference,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VarModSlot;

    fn candidate(mass: f32, var_mods: [VarModSlot; 3]) -> Candidate {
        Candidate {
            protein_index: 0,
            start: 0,
            length: 5,
            decoy: false,
            monoisotopic_mass: mass,
            var_mods,
        }
    }

    fn scan(precursor_mass: f64) -> Ms2Scan {
        Ms2Scan::try_new(7, vec![], vec![], precursor_mass).unwrap()
    }

    const EMPTY: [VarModSlot; 3] = [VarModSlot {
        type_id: 0,
        position: 0,
    }; 3];

    #[test]
    fn test_tie_break_prefers_anchor_in_both_orders() {
        // Same score, one candidate at +0.1 Da and one at +16 Da.
        let near = candidate(1000.0, EMPTY);
        let far = candidate(984.0, EMPTY);
        let modes = vec![SearchMode::open()];
        let scan = scan(1000.1);

        for candidates in [vec![near, far], vec![far, near]] {
            let selector = ModeSelector::new(&candidates, &modes);
            let out = selector.select(&scan, &[5.0, 5.0]);
            let m = out[0].unwrap();
            assert_eq!(candidates[m.candidate_index as usize], near);
            assert!((m.mass_difference - 0.1).abs() < 1e-3);
        }
    }

    #[test]
    fn test_tie_break_prefers_fewer_mods() {
        let mut one_mod = EMPTY;
        one_mod[0] = VarModSlot {
            type_id: 1,
            position: 3,
        };
        let plain = candidate(1000.0, EMPTY);
        let modified = candidate(1000.0, one_mod);
        let modes = vec![SearchMode::open()];

        for candidates in [vec![plain, modified], vec![modified, plain]] {
            let selector = ModeSelector::new(&candidates, &modes);
            let m = selector.select(&scan(1000.0), &[2.0, 2.0])[0].unwrap();
            assert_eq!(candidates[m.candidate_index as usize], plain);
        }
    }

    #[test]
    fn test_higher_score_wins_outside_anchor() {
        let near = candidate(1000.0, EMPTY);
        let far = candidate(900.0, EMPTY);
        let candidates = vec![near, far];
        let modes = vec![SearchMode::open(), SearchMode::within_half_dalton()];
        let selector = ModeSelector::new(&candidates, &modes);
        let out = selector.select(&scan(1000.0), &[3.0, 4.0]);

        assert_eq!(out[0].unwrap().candidate_index, 1);
        assert_eq!(out[0].unwrap().search_mode, 0);
        assert_eq!(out[1].unwrap().candidate_index, 0);
        assert_eq!(out[1].unwrap().search_mode, 1);
    }

    #[test]
    fn test_no_candidate_gives_no_match() {
        let candidates = vec![candidate(1000.0, EMPTY), candidate(500.0, EMPTY)];
        let modes = vec![SearchMode::open(), SearchMode::within_half_dalton()];
        let selector = ModeSelector::new(&candidates, &modes);

        let out = selector.select(&scan(1000.0), &[0.0, 0.0]);
        assert_eq!(out, vec![None, None]);

        // Scored, but nothing within the narrow mode's window.
        let out = selector.select(&scan(2000.0), &[1.0, 1.0]);
        assert!(out[0].is_some());
        assert!(out[1].is_none());
    }

    #[test]
    fn test_anchor_boundary_is_not_near() {
        let a = candidate(1000.0, EMPTY);
        let b = candidate(1000.0, EMPTY);
        assert!(first_is_preferable(&a, 0.25, &b, 2.0));
        assert!(first_is_preferable(&a, -0.25, &b, -2.0));
        // Exactly 0.5 away is neither near nor far, so slots decide (a draw).
        assert!(!first_is_preferable(&a, 0.5, &b, 2.0));
        assert!(!first_is_preferable(&a, 0.25, &b, 0.5));
    }
}
