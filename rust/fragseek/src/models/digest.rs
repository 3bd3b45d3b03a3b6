use std::ops::Range;
use std::sync::Arc;

/// A peptide backbone: a window over its parent protein sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestSlice {
    ref_seq: Arc<str>,
    range: Range<usize>,
}

impl DigestSlice {
    pub fn new(ref_seq: Arc<str>, range: Range<usize>) -> Self {
        Self { ref_seq, range }
    }

    pub fn sequence(&self) -> &str {
        &self.ref_seq.as_ref()[self.range.clone()]
    }

    /// Sequence with isoleucine collapsed onto leucine (identical mass).
    pub fn leucine_sequence(&self) -> String {
        self.sequence().replace('I', "L")
    }

    /// Zero-based offset of the first residue within the protein.
    pub fn start(&self) -> usize {
        self.range.start
    }

    pub fn end(&self) -> usize {
        self.range.end
    }

    /// True if the peptide starts the protein, counting a removed initiator
    /// methionine as still being at the protein N-terminus.
    pub fn is_protein_n_term(&self) -> bool {
        self.range.start == 0
            || (self.range.start == 1 && self.ref_seq.as_bytes().first() == Some(&b'M'))
    }

    pub fn is_protein_c_term(&self) -> bool {
        self.range.end == self.ref_seq.len()
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_terminals() {
        let seq: Arc<str> = "MPEPTIDEKPINKTOMATR".into();
        let first = DigestSlice::new(seq.clone(), 0..9);
        let no_met = DigestSlice::new(seq.clone(), 1..9);
        let middle = DigestSlice::new(seq.clone(), 9..13);
        let last = DigestSlice::new(seq.clone(), 13..19);

        assert_eq!(first.sequence(), "MPEPTIDEK");
        assert_eq!(no_met.sequence(), "PEPTIDEK");
        assert_eq!(middle.sequence(), "PINK");
        assert_eq!(middle.leucine_sequence(), "PLNK");
        assert!(first.is_protein_n_term());
        assert!(no_met.is_protein_n_term());
        assert!(!middle.is_protein_n_term());
        assert!(!middle.is_protein_c_term());
        assert!(last.is_protein_c_term());
        assert_eq!(last.len(), 6);
        assert_eq!((middle.start(), middle.end()), (9, 13));
    }
}
