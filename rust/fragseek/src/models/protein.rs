use super::decoy::{
    DecoyMarking,
    as_decoy_string,
    decoy_position,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// A protein sequence as handed over by the database reader.
///
/// `localized_modifications` maps one-based residue positions to indices in
/// [`crate::models::ModificationCatalog::localizable`]. These are the sites a
/// database annotated as modifiable for this particular protein.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protein {
    pub accession: String,
    pub sequence: Arc<str>,
    #[serde(default)]
    pub decoy: DecoyMarking,
    #[serde(default)]
    pub localized_modifications: BTreeMap<usize, Vec<usize>>,
}

impl Protein {
    /// Builds a target protein, upper-casing the sequence and dropping
    /// anything that is not an ascii letter (whitespace, stop codons ...).
    pub fn new(accession: impl Into<String>, sequence: &str) -> Self {
        let sequence: String = sequence
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        Self {
            accession: accession.into(),
            sequence: sequence.into(),
            decoy: DecoyMarking::Target,
            localized_modifications: BTreeMap::new(),
        }
    }

    /// Sites outside the sequence are dropped with a warning.
    pub fn with_localized_modifications(mut self, mut sites: BTreeMap<usize, Vec<usize>>) -> Self {
        let len = self.len();
        let before = sites.len();
        sites.retain(|pos, _| (1..=len).contains(pos));
        if sites.len() < before {
            warn!(
                "Dropped {} localized sites outside of protein {} (length {})",
                before - sites.len(),
                self.accession,
                len
            );
        }
        self.localized_modifications = sites;
        self
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn is_decoy(&self) -> bool {
        self.decoy.is_decoy()
    }

    /// Reversed-sequence decoy of this protein.
    ///
    /// Localized sites travel with their residue.
    pub fn reversed_decoy(&self) -> Protein {
        let sites = self
            .localized_modifications
            .iter()
            .filter_map(|(pos, mods)| Some((decoy_position(&self.sequence, *pos)?, mods.clone())))
            .collect();
        Protein {
            accession: format!("DECOY_{}", self.accession),
            sequence: as_decoy_string(&self.sequence).into(),
            decoy: DecoyMarking::ReversedDecoy,
            localized_modifications: sites,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protein_cleanup() {
        let prot = Protein::new("P1", "mpep tide*\nk");
        assert_eq!(prot.sequence.as_ref(), "MPEPTIDEK");
        assert!(!prot.is_decoy());
    }

    #[test]
    fn test_reversed_decoy_keeps_sites() {
        let mut sites = BTreeMap::new();
        sites.insert(5, vec![0]);
        let prot = Protein::new("P1", "MPEPTIDEK").with_localized_modifications(sites);
        let decoy = prot.reversed_decoy();
        assert_eq!(decoy.sequence.as_ref(), "MKEDITPEP");
        assert_eq!(decoy.accession, "DECOY_P1");
        assert!(decoy.is_decoy());
        let (pos, _) = decoy.localized_modifications.iter().next().unwrap();
        assert_eq!(decoy.sequence.as_bytes()[pos - 1], b'T');
    }

    #[test]
    fn test_out_of_range_sites_are_dropped() {
        let mut sites = BTreeMap::new();
        sites.insert(0, vec![0]);
        sites.insert(3, vec![0]);
        sites.insert(20, vec![1]);
        let prot = Protein::new("P1", "PEPTIDEK").with_localized_modifications(sites);
        assert_eq!(prot.localized_modifications.keys().copied().collect::<Vec<_>>(), vec![3]);

        // Sites set directly on the struct never reach the decoy.
        let mut prot = Protein::new("P2", "MPEPTIDEK");
        prot.localized_modifications.insert(20, vec![0]);
        prot.localized_modifications.insert(2, vec![0]);
        let decoy = prot.reversed_decoy();
        assert_eq!(decoy.localized_modifications.len(), 1);
        assert_eq!(decoy.localized_modifications.get(&9), Some(&vec![0]));
    }
}
