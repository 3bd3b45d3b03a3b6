//! Monoisotopic masses used throughout the crate.
//!
//! All values are in daltons.

pub const PROTON: f64 = 1.007_276_466_879;
pub const HYDROGEN: f64 = 1.007_825_032_07;
pub const OXYGEN: f64 = 15.994_914_619_56;
pub const NITROGEN: f64 = 14.003_074_004_8;
pub const WATER: f64 = 2.0 * HYDROGEN + OXYGEN;
pub const AMMONIA: f64 = NITROGEN + 3.0 * HYDROGEN;

/// Monoisotopic residue mass of a (one letter code) amino acid.
///
/// Returns `None` for ambiguous or unknown codes (B, J, X, Z ...).
///
/// ```
/// use fragseek::chemistry::residue_mass;
///
/// assert!(residue_mass('G').is_some());
/// assert_eq!(residue_mass('I'), residue_mass('L'));
/// assert!(residue_mass('X').is_none());
/// ```
pub fn residue_mass(residue: char) -> Option<f64> {
    let mass = match residue {
        'G' => 57.021_463_72,
        'A' => 71.037_113_81,
        'S' => 87.032_028_40,
        'P' => 97.052_763_88,
        'V' => 99.068_413_95,
        'T' => 101.047_678_47,
        'C' => 103.009_184_51,
        'L' | 'I' => 113.084_064_01,
        'N' => 114.042_927_44,
        'D' => 115.026_943_03,
        'Q' => 128.058_577_54,
        'K' => 128.094_963_02,
        'E' => 129.042_593_09,
        'M' => 131.040_484_63,
        'H' => 137.058_911_86,
        'F' => 147.068_413_91,
        'U' => 150.953_635_59,
        'R' => 156.101_111_05,
        'Y' => 163.063_328_53,
        'W' => 186.079_312_98,
        'O' => 237.147_726_96,
        _ => return None,
    };
    Some(mass)
}

/// Sum of residue masses plus water, ie. the unmodified neutral mass.
pub fn unmodified_peptide_mass(sequence: &str) -> Option<f64> {
    sequence
        .chars()
        .map(residue_mass)
        .sum::<Option<f64>>()
        .map(|x| x + WATER)
}
