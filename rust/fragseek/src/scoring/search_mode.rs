use super::scorer::MassTolerance;
use crate::errors::ConfigurationError;
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::HashSet;

/// Decides which precursor-minus-candidate mass differences a search mode
/// accepts. Relative windows are sized on the candidate mass.
pub trait MassDiffAcceptor: Send + Sync {
    fn accepts(&self, mass_difference: f64, candidate_mass: f64) -> bool;

    /// Which window of the acceptor matched, `None` if none did.
    fn notch(&self, mass_difference: f64, candidate_mass: f64) -> Option<usize> {
        self.accepts(mass_difference, candidate_mass).then_some(0)
    }

    /// Short key, used to name output files.
    fn file_key(&self) -> &str;
}

fn default_exclusion_tolerance() -> f64 {
    0.01
}

/// The ways a search mode can restrict the mass difference.
///
/// Bounds are inclusive. Everything but `ppm_around_zero` and the `dots`
/// tolerance is in daltons.
///
/// ```
/// use fragseek::scoring::{AcceptanceKind, MassDiffAcceptor, SearchMode};
///
/// let mode: SearchMode = serde_json::from_str(
///     r#"{"name": "notched", "type": "dots", "offsets": [0.0, 1.0034], "tolerance": {"da": 0.01}}"#,
/// ).unwrap();
/// assert!(matches!(mode.kind, AcceptanceKind::Dots { .. }));
/// assert_eq!(mode.notch(1.004, 1500.0), Some(1));
/// assert!(!mode.accepts(0.5, 1500.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AcceptanceKind {
    /// Everything goes.
    Open,
    /// `|d| <= max_abs_difference`, except within `exclusion_tolerance` of
    /// any of the `exclusions`.
    Threshold {
        max_abs_difference: f64,
        #[serde(default)]
        exclusions: Vec<f64>,
        #[serde(default = "default_exclusion_tolerance")]
        exclusion_tolerance: f64,
    },
    /// `lo <= d <= hi` for any of the windows.
    Intervals { intervals: Vec<(f64, f64)> },
    /// `|d| <= ppm * 1e-6 * candidate_mass`.
    PpmAroundZero { ppm: f64 },
    /// `|d - offset|` within `tolerance` of `candidate_mass + offset` for any
    /// of the offsets.
    Dots {
        offsets: Vec<f64>,
        tolerance: MassTolerance,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMode {
    pub name: String,
    #[serde(flatten)]
    pub kind: AcceptanceKind,
}

impl SearchMode {
    pub fn new(name: impl Into<String>, kind: AcceptanceKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn open() -> Self {
        Self::new("open", AcceptanceKind::Open)
    }

    pub fn within_half_dalton() -> Self {
        Self::new(
            "withinHalfADaltonOfZero",
            AcceptanceKind::Intervals {
                intervals: vec![(-0.5, 0.5)],
            },
        )
    }

    pub fn ppm_around_zero(ppm: f64) -> Self {
        Self::new(
            format!("{}ppmAroundZero", ppm),
            AcceptanceKind::PpmAroundZero { ppm },
        )
    }

    pub fn dots(name: impl Into<String>, offsets: Vec<f64>, tolerance: MassTolerance) -> Self {
        Self::new(name, AcceptanceKind::Dots { offsets, tolerance })
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidSearchMode {
            name: self.name.clone(),
            reason,
        };
        if self.name.trim().is_empty() {
            return Err(invalid("search mode name is empty".to_string()));
        }
        if self
            .name
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        {
            return Err(invalid(format!(
                "{:?} cannot be used as a file name",
                self.name
            )));
        }
        match &self.kind {
            AcceptanceKind::Open => {}
            AcceptanceKind::Threshold {
                max_abs_difference,
                exclusions,
                exclusion_tolerance,
            } => {
                if !max_abs_difference.is_finite() || *max_abs_difference < 0.0 {
                    return Err(invalid(format!(
                        "threshold {} is not a non-negative number",
                        max_abs_difference
                    )));
                }
                if !exclusion_tolerance.is_finite() || *exclusion_tolerance < 0.0 {
                    return Err(invalid(format!(
                        "exclusion tolerance {} is not a non-negative number",
                        exclusion_tolerance
                    )));
                }
                if exclusions.iter().any(|x| !x.is_finite()) {
                    return Err(invalid("exclusions must be finite".to_string()));
                }
            }
            AcceptanceKind::Intervals { intervals } => {
                if intervals.is_empty() {
                    return Err(invalid("no intervals given".to_string()));
                }
                for (lo, hi) in intervals {
                    if !lo.is_finite() || !hi.is_finite() || lo > hi {
                        return Err(invalid(format!("invalid interval ({}, {})", lo, hi)));
                    }
                }
            }
            AcceptanceKind::PpmAroundZero { ppm } => {
                if !ppm.is_finite() || *ppm < 0.0 {
                    return Err(invalid(format!(
                        "ppm tolerance {} is not a non-negative number",
                        ppm
                    )));
                }
            }
            AcceptanceKind::Dots { offsets, tolerance } => {
                if offsets.is_empty() {
                    return Err(invalid("no offsets given".to_string()));
                }
                if offsets.iter().any(|x| !x.is_finite()) {
                    return Err(invalid("offsets must be finite".to_string()));
                }
                if !tolerance.is_valid() {
                    return Err(invalid(format!(
                        "tolerance {:?} is not a non-negative number",
                        tolerance
                    )));
                }
            }
        }
        Ok(())
    }
}

impl MassDiffAcceptor for SearchMode {
    fn accepts(&self, mass_difference: f64, candidate_mass: f64) -> bool {
        self.notch(mass_difference, candidate_mass).is_some()
    }

    fn notch(&self, mass_difference: f64, candidate_mass: f64) -> Option<usize> {
        match &self.kind {
            AcceptanceKind::Open => Some(0),
            AcceptanceKind::Threshold {
                max_abs_difference,
                exclusions,
                exclusion_tolerance,
            } => {
                let excluded = exclusions
                    .iter()
                    .any(|x| (mass_difference - x).abs() <= *exclusion_tolerance);
                (mass_difference.abs() <= *max_abs_difference && !excluded).then_some(0)
            }
            AcceptanceKind::Intervals { intervals } => intervals
                .iter()
                .position(|(lo, hi)| *lo <= mass_difference && mass_difference <= *hi),
            AcceptanceKind::PpmAroundZero { ppm } => {
                (mass_difference.abs() <= candidate_mass.abs() * ppm * 1e-6).then_some(0)
            }
            AcceptanceKind::Dots { offsets, tolerance } => offsets.iter().position(|x| {
                (mass_difference - x).abs() <= tolerance.width_at(candidate_mass + x)
            }),
        }
    }

    fn file_key(&self) -> &str {
        &self.name
    }
}

/// Validates every mode and checks that their file keys are unique.
pub fn validate_search_modes(modes: &[SearchMode]) -> Result<(), ConfigurationError> {
    if modes.is_empty() {
        return Err(ConfigurationError::EmptyInput {
            context: "no search modes configured",
        });
    }
    let mut seen = HashSet::new();
    for mode in modes {
        mode.validate()?;
        if !seen.insert(mode.file_key()) {
            return Err(ConfigurationError::InvalidSearchMode {
                name: mode.name.clone(),
                reason: "duplicated search mode name".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_accepts_everything() {
        let mode = SearchMode::open();
        assert!(mode.accepts(-500.0, 1000.0));
        assert!(mode.accepts(0.0, 1000.0));
        assert!(mode.accepts(1e6, 1000.0));
    }

    #[test]
    fn test_threshold_with_exclusions() {
        let mode = SearchMode::new(
            "no_oxidation",
            AcceptanceKind::Threshold {
                max_abs_difference: 100.0,
                exclusions: vec![15.9949],
                exclusion_tolerance: 0.01,
            },
        );
        assert!(mode.accepts(0.0, 1000.0));
        assert!(mode.accepts(-99.0, 1000.0));
        assert!(!mode.accepts(15.995, 1000.0));
        assert!(!mode.accepts(150.0, 1000.0));
    }

    #[test]
    fn test_intervals_notch() {
        let mode = SearchMode::new(
            "two_windows",
            AcceptanceKind::Intervals {
                intervals: vec![(-0.5, 0.5), (0.5, 1.5)],
            },
        );
        assert_eq!(mode.notch(0.1, 1000.0), Some(0));
        assert_eq!(mode.notch(1.0, 1000.0), Some(1));
        assert_eq!(mode.notch(2.0, 1000.0), None);
        assert!(SearchMode::within_half_dalton().accepts(0.49, 1000.0));
        assert!(!SearchMode::within_half_dalton().accepts(0.51, 1000.0));
    }

    #[test]
    fn test_ppm_around_zero_scales_with_mass() {
        let mode = SearchMode::ppm_around_zero(5.0);
        assert_eq!(mode.name, "5ppmAroundZero");
        // 5 ppm of 1000 Da is 0.005 Da, of 4000 Da 0.02 Da.
        assert!(mode.accepts(0.004, 1000.0));
        assert!(mode.accepts(-0.004, 1000.0));
        assert!(!mode.accepts(0.006, 1000.0));
        assert!(mode.accepts(0.019, 4000.0));
        assert!(!mode.accepts(0.021, 4000.0));
    }

    #[test]
    fn test_dots_with_ppm_tolerance() {
        let mode = SearchMode::dots(
            "c13",
            vec![0.0, 1.003355],
            MassTolerance::Ppm(10.0),
        );
        // 10 ppm of ~2000 Da is ~0.02 Da.
        assert_eq!(mode.notch(0.015, 2000.0), Some(0));
        assert_eq!(mode.notch(1.003355 - 0.015, 2000.0), Some(1));
        assert_eq!(mode.notch(0.5, 2000.0), None);
        // The same offset is out of a 10 ppm window at 500 Da.
        assert_eq!(mode.notch(0.015, 500.0), None);
    }

    #[test]
    fn test_mode_validation() {
        let bad_interval = SearchMode::new(
            "bad",
            AcceptanceKind::Intervals {
                intervals: vec![(1.0, -1.0)],
            },
        );
        assert!(bad_interval.validate().is_err());
        let da = MassTolerance::Absolute(0.01);
        assert!(SearchMode::dots("bad/name", vec![0.0], da).validate().is_err());
        assert!(SearchMode::dots("nan", vec![f64::NAN], da).validate().is_err());
        assert!(SearchMode::dots("neg", vec![0.0], MassTolerance::Ppm(-1.0)).validate().is_err());
        assert!(SearchMode::ppm_around_zero(f64::INFINITY).validate().is_err());
        assert!(SearchMode::ppm_around_zero(5.0).validate().is_ok());

        let dup = vec![SearchMode::open(), SearchMode::open()];
        assert!(matches!(
            validate_search_modes(&dup),
            Err(ConfigurationError::InvalidSearchMode { .. })
        ));
        assert!(matches!(
            validate_search_modes(&[]),
            Err(ConfigurationError::EmptyInput { .. })
        ));
        assert!(validate_search_modes(&[SearchMode::open(), SearchMode::within_half_dalton()]).is_ok());
    }

    #[test]
    fn test_mode_from_json() {
        let modes: Vec<SearchMode> = serde_json::from_str(
            r#"[
                {"name": "open", "type": "open"},
                {"name": "narrow", "type": "intervals", "intervals": [[-0.5, 0.5]]},
                {"name": "thresh", "type": "threshold", "max_abs_difference": 200.0},
                {"name": "tight", "type": "ppm_around_zero", "ppm": 5.0},
                {"name": "dots", "type": "dots", "offsets": [0.0], "tolerance": {"ppm": 10.0}}
            ]"#,
        )
        .unwrap();
        assert_eq!(modes[0], SearchMode::open());
        assert_eq!(modes[1].kind, SearchMode::within_half_dalton().kind);
        match &modes[2].kind {
            AcceptanceKind::Threshold {
                exclusion_tolerance,
                exclusions,
                ..
            } => {
                assert_eq!(*exclusion_tolerance, 0.01);
                assert!(exclusions.is_empty());
            }
            other => panic!("unexpected kind {:?}", other),
        }
        assert_eq!(modes[3].kind, AcceptanceKind::PpmAroundZero { ppm: 5.0 });
        assert_eq!(
            modes[4].kind,
            AcceptanceKind::Dots {
                offsets: vec![0.0],
                tolerance: MassTolerance::Ppm(10.0),
            }
        );
    }
}
