use serde::{
    Deserialize,
    Serialize,
};

/// The different labels that denote if a sequence is a decoy or not.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, std::hash::Hash, PartialOrd, Ord,
)]
pub enum DecoyMarking {
    #[default]
    Target,
    /// Sequence was reversed when the decoy protein was generated.
    ReversedDecoy,
}

impl DecoyMarking {
    pub fn is_decoy(&self) -> bool {
        match self {
            DecoyMarking::Target => false,
            DecoyMarking::ReversedDecoy => true,
        }
    }
}

/// Reverses a protein sequence, keeping an initiator methionine in place.
pub(crate) fn as_decoy_string(sequence: &str) -> String {
    match sequence.strip_prefix('M') {
        Some(rest) => {
            let mut out = String::with_capacity(sequence.len());
            out.push('M');
            out.extend(rest.chars().rev());
            out
        }
        None => sequence.chars().rev().collect(),
    }
}

/// Where a one-based residue position ends up after [`as_decoy_string`].
///
/// `None` for positions outside the sequence.
pub(crate) fn decoy_position(sequence: &str, one_based_position: usize) -> Option<usize> {
    let len = sequence.len();
    if one_based_position == 0 || one_based_position > len {
        return None;
    }
    if sequence.starts_with('M') {
        if one_based_position == 1 {
            Some(1)
        } else {
            (len + 2).checked_sub(one_based_position)
        }
    } else {
        (len + 1).checked_sub(one_based_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoy() {
        let sequence = "MPEPTIDEPINK";
        let decoy = as_decoy_string(sequence);
        assert_eq!(sequence, "MPEPTIDEPINK");
        assert_eq!(decoy, "MKNIPEDITPEP");
        assert_eq!(as_decoy_string("PEPTIDEK"), "KEDITPEP");
    }

    #[test]
    fn test_decoy_position() {
        let sequence = "MPEPTIDEPINK";
        let decoy = as_decoy_string(sequence);
        for pos in 1..=sequence.len() {
            let new_pos = decoy_position(sequence, pos).unwrap();
            assert_eq!(
                sequence.as_bytes()[pos - 1],
                decoy.as_bytes()[new_pos - 1],
                "position {}",
                pos
            );
        }
        assert_eq!(decoy_position("PEPTIDEK", 1), Some(8));
        assert_eq!(decoy_position("PEPTIDEK", 0), None);
        assert_eq!(decoy_position("PEPTIDEK", 9), None);
        assert_eq!(decoy_position("MPEPTIDEK", 20), None);
    }
}
