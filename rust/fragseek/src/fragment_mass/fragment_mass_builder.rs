use crate::chemistry::{
    AMMONIA,
    NITROGEN,
    OXYGEN,
    WATER,
};
use crate::indexing::modified_peptide::ModifiedPeptide;
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt::Display;

pub const DEFAULT_MAX_FRAGMENT_MASS: f64 = 30_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IonType {
    B,
    C,
    Y,
    Zdot,
}

impl Display for IonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IonType::B => "b",
            IonType::C => "c",
            IonType::Y => "y",
            IonType::Zdot => "zdot",
        };
        write!(f, "{}", s)
    }
}

/// Generates theoretical neutral fragment masses for the configured ion series.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentMassBuilder {
    pub ion_types: Vec<IonType>,
    pub max_fragment_mass: f64,
}

impl Default for FragmentMassBuilder {
    fn default() -> Self {
        Self {
            ion_types: vec![IonType::B, IonType::Y],
            max_fragment_mass: DEFAULT_MAX_FRAGMENT_MASS,
        }
    }
}

impl FragmentMassBuilder {
    /// Writes the fragment masses of `peptide` into `out` (cleared first).
    ///
    /// b1 is never produced, and neither is the full length fragment of any
    /// series. c ions N-terminal to a proline and z ions starting with a
    /// proline are skipped.
    #[cfg_attr(
        feature = "instrumentation",
        tracing::instrument(skip_all, level = "trace")
    )]
    pub fn fragment_masses(&self, peptide: &ModifiedPeptide, out: &mut Vec<f64>) {
        out.clear();
        let len = peptide.len();
        if len < 2 {
            return;
        }
        let residues = peptide.sequence.as_bytes();

        let mut prefix = peptide.n_term_shift();
        let mut suffix = peptide.c_term_shift();
        for r in 1..len {
            prefix += peptide.residue_mass_with_mods(r - 1);
            suffix += peptide.residue_mass_with_mods(len - r);
            for ion in self.ion_types.iter() {
                let mass = match ion {
                    IonType::B if r >= 2 => prefix,
                    IonType::C if residues[r] != b'P' => prefix + AMMONIA,
                    IonType::Y => suffix + WATER,
                    IonType::Zdot if residues[len - r] != b'P' => suffix + OXYGEN - NITROGEN,
                    _ => continue,
                };
                if mass > 0.0 && mass < self.max_fragment_mass {
                    out.push(mass);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::residue_mass;

    fn unmodified(seq: &str) -> (Vec<f64>, Vec<f64>) {
        let masses: Vec<f64> = seq.chars().map(|c| residue_mass(c).unwrap()).collect();
        let shifts = vec![0.0; seq.len() + 4];
        (masses, shifts)
    }

    #[test]
    fn test_by_ions() {
        let seq = "PEPTIDEK";
        let (masses, shifts) = unmodified(seq);
        let peptide = ModifiedPeptide::new(seq, &masses, &shifts);
        let builder = FragmentMassBuilder::default();
        let mut out = Vec::new();
        builder.fragment_masses(&peptide, &mut out);

        // b2..b7 and y1..y7
        assert_eq!(out.len(), 6 + 7);
        let y1 = residue_mass('K').unwrap() + WATER;
        assert!(out.iter().any(|x| (x - y1).abs() < 1e-9));
        let b2 = residue_mass('P').unwrap() + residue_mass('E').unwrap();
        assert!(out.iter().any(|x| (x - b2).abs() < 1e-9));
        let b1 = residue_mass('P').unwrap();
        assert!(!out.iter().any(|x| (x - b1).abs() < 1e-9));
    }

    #[test]
    fn test_c_z_proline_rule() {
        let seq = "PEPTIDEK";
        let (masses, shifts) = unmodified(seq);
        let peptide = ModifiedPeptide::new(seq, &masses, &shifts);
        let builder = FragmentMassBuilder {
            ion_types: vec![IonType::C, IonType::Zdot],
            ..Default::default()
        };
        let mut out = Vec::new();
        builder.fragment_masses(&peptide, &mut out);
        // c2 is skipped (followed by P), the other six are kept.
        // z1..z7 except z6 which would start with the P at index 2.
        assert_eq!(out.len(), 6 + 6);
    }

    #[test]
    fn test_terminal_mods_shift_series() {
        let seq = "PEPTIDEK";
        let (masses, mut shifts) = unmodified(seq);
        let builder = FragmentMassBuilder::default();
        let mut plain = Vec::new();
        builder.fragment_masses(&ModifiedPeptide::new(seq, &masses, &shifts), &mut plain);

        // peptide N-term shift moves every b ion, leaves y ions alone
        shifts[1] = 42.0;
        let mut shifted = Vec::new();
        builder.fragment_masses(&ModifiedPeptide::new(seq, &masses, &shifts), &mut shifted);
        let num_b = 6;
        let num_moved = plain
            .iter()
            .zip(shifted.iter())
            .filter(|(a, b)| (*b - *a - 42.0).abs() < 1e-9)
            .count();
        assert_eq!(num_moved, num_b);
    }
}
