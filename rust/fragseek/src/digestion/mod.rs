mod protease;

pub use protease::{
    CleavageTerminus,
    Protease,
};

use crate::errors::ConfigurationError;
use crate::models::{
    DigestSlice,
    Protein,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt::Display;

/// Hard limits on the peptide length. The upper one keeps every two-based
/// modification position inside a `u8`.
pub const MIN_PEPTIDE_LENGTH: usize = 2;
pub const MAX_PEPTIDE_LENGTH: usize = 252;

/// What to do with a protein-leading methionine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitiatorMethionineBehavior {
    Retain,
    Cleave,
    /// Emit both the retained and the cleaved variant.
    #[default]
    Variable,
}

impl Display for InitiatorMethionineBehavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InitiatorMethionineBehavior::Retain => "retain",
            InitiatorMethionineBehavior::Cleave => "cleave",
            InitiatorMethionineBehavior::Variable => "variable",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestionParameters {
    pub protease: Protease,
    pub max_missed_cleavages: usize,
    pub initiator_methionine: InitiatorMethionineBehavior,
    pub min_peptide_length: usize,
    pub max_peptide_length: usize,
}

impl Default for DigestionParameters {
    fn default() -> Self {
        Self {
            protease: Protease::trypsin(),
            max_missed_cleavages: 2,
            initiator_methionine: InitiatorMethionineBehavior::Variable,
            min_peptide_length: MIN_PEPTIDE_LENGTH,
            max_peptide_length: MAX_PEPTIDE_LENGTH,
        }
    }
}

impl DigestionParameters {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.min_peptide_length > self.max_peptide_length {
            return Err(ConfigurationError::InvalidParameter {
                field: "min_peptide_length",
                reason: format!(
                    "min length {} is larger than max length {}",
                    self.min_peptide_length, self.max_peptide_length
                ),
            });
        }
        if self.protease.cleavage_residues.is_empty() {
            return Err(ConfigurationError::InvalidParameter {
                field: "protease",
                reason: format!("protease {} has no cleavage residues", self.protease),
            });
        }
        Ok(())
    }

    fn length_range(&self) -> std::ops::RangeInclusive<usize> {
        self.min_peptide_length.max(MIN_PEPTIDE_LENGTH)
            ..=self.max_peptide_length.min(MAX_PEPTIDE_LENGTH)
    }
}

/// Digests a protein into peptide backbones, appending them to `out`.
///
/// Backbones outside the allowed length window are dropped here.
pub fn digest_protein(protein: &Protein, params: &DigestionParameters, out: &mut Vec<DigestSlice>) {
    let seq = protein.sequence.as_bytes();
    let len = seq.len();
    if len == 0 {
        return;
    }
    let mut sites = Vec::with_capacity(8);
    sites.push(0);
    sites.extend(params.protease.cleavage_sites(seq));
    sites.push(len);

    let starts_with_met = seq[0] == b'M';
    let lengths = params.length_range();
    let mut push = |start: usize, end: usize| {
        if start < end && lengths.contains(&(end - start)) {
            out.push(DigestSlice::new(protein.sequence.clone(), start..end));
        }
    };

    for missed in 0..=params.max_missed_cleavages {
        if missed + 1 >= sites.len() {
            break;
        }
        for i in 0..(sites.len() - missed - 1) {
            let start = sites[i];
            let end = sites[i + missed + 1];
            let leading_met = i == 0 && starts_with_met;
            if !(leading_met && params.initiator_methionine == InitiatorMethionineBehavior::Cleave)
            {
                push(start, end);
            }
            if leading_met && params.initiator_methionine != InitiatorMethionineBehavior::Retain {
                push(1, end);
            }
        }
    }
}
