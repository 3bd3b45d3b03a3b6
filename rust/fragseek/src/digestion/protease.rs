use crate::errors::ConfigurationError;
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt::Display;
use std::str::FromStr;

/// Which side of the cleavage residue the protease cuts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleavageTerminus {
    /// Cut after the residue (trypsin cuts after K/R).
    C,
    /// Cut before the residue (Asp-N cuts before D).
    N,
}

/// A fully specific protease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protease {
    pub name: String,
    pub cleavage_residues: Vec<char>,
    /// Residues that block cleavage when they sit on the far side of the
    /// cut (proline for trypsin).
    #[serde(default)]
    pub restriction_residues: Vec<char>,
    pub terminus: CleavageTerminus,
}

impl Protease {
    fn preset(name: &str, cleave: &str, restrict: &str, terminus: CleavageTerminus) -> Self {
        Self {
            name: name.to_string(),
            cleavage_residues: cleave.chars().collect(),
            restriction_residues: restrict.chars().collect(),
            terminus,
        }
    }

    pub fn trypsin() -> Self {
        Self::preset("trypsin", "KR", "P", CleavageTerminus::C)
    }

    /// Every protease known by name.
    pub fn presets() -> Vec<Self> {
        vec![
            Self::trypsin(),
            Self::preset("trypsin/p", "KR", "", CleavageTerminus::C),
            Self::preset("lys-c", "K", "", CleavageTerminus::C),
            Self::preset("arg-c", "R", "", CleavageTerminus::C),
            Self::preset("glu-c", "E", "", CleavageTerminus::C),
            Self::preset("chymotrypsin", "FWYL", "P", CleavageTerminus::C),
            Self::preset("asp-n", "D", "", CleavageTerminus::N),
        ]
    }

    /// Zero-based indices `i` such that the protease cuts between residue
    /// `i - 1` and residue `i`. Never includes `0` or `sequence.len()`.
    pub fn cleavage_sites(&self, sequence: &[u8]) -> Vec<usize> {
        let mut out = Vec::new();
        for i in 1..sequence.len() {
            let before = sequence[i - 1] as char;
            let after = sequence[i] as char;
            let cuts = match self.terminus {
                CleavageTerminus::C => {
                    self.cleavage_residues.contains(&before)
                        && !self.restriction_residues.contains(&after)
                }
                CleavageTerminus::N => {
                    self.cleavage_residues.contains(&after)
                        && !self.restriction_residues.contains(&before)
                }
            };
            if cuts {
                out.push(i);
            }
        }
        out
    }
}

impl Default for Protease {
    fn default() -> Self {
        Self::trypsin()
    }
}

impl Display for Protease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl FromStr for Protease {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::presets()
            .into_iter()
            .find(|x| x.name == needle)
            .ok_or(ConfigurationError::UnknownProtease {
                name: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trypsin_sites() {
        let trypsin = Protease::trypsin();
        // Cuts after K and R, but not before P, and never at the very end.
        let sites = trypsin.cleavage_sites(b"PEPKTIDERPEPTIDEK");
        assert_eq!(sites, vec![4]);
        assert!(trypsin.cleavage_sites(b"MPEPTIDEK").is_empty());
    }

    #[test]
    fn test_asp_n_sites() {
        let aspn: Protease = "Asp-N".parse().unwrap();
        assert_eq!(aspn.terminus, CleavageTerminus::N);
        assert_eq!(aspn.cleavage_sites(b"PEPTIDEKDA"), vec![5, 8]);
    }

    #[test]
    fn test_unknown_protease() {
        assert!(matches!(
            "pepsin".parse::<Protease>(),
            Err(ConfigurationError::UnknownProtease { .. })
        ));
    }
}
