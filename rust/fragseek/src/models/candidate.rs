use super::modification::ModificationCatalog;
use super::protein::Protein;
use crate::indexing::modified_peptide::annotate_sequence;
use serde::{
    Deserialize,
    Serialize,
};

pub const NUM_VAR_MOD_SLOTS: usize = 3;

/// One variable modification placed on a candidate.
///
/// `type_id == 0` marks an empty slot. `position` uses the two-based scheme
/// (0 = protein N-term, 1 = peptide N-term, `r + 2` = residue `r`,
/// `L + 2` = peptide C-term, `L + 3` = protein C-term).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarModSlot {
    pub type_id: u16,
    pub position: u8,
}

impl VarModSlot {
    pub fn is_empty(&self) -> bool {
        self.type_id == 0
    }
}

/// Compact record of a digested and modified peptide.
///
/// Everything else (sequence, modification names) is resolved on demand
/// through the protein list and the modification catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub protein_index: u32,
    pub start: u32,
    pub length: u8,
    pub decoy: bool,
    pub monoisotopic_mass: f32,
    pub var_mods: [VarModSlot; NUM_VAR_MOD_SLOTS],
}

impl Candidate {
    pub fn num_var_mods(&self) -> usize {
        self.var_mods.iter().filter(|x| !x.is_empty()).count()
    }

    /// Backbone sequence of the candidate, `None` if it does not fit the
    /// protein list it is resolved against.
    pub fn sequence<'a>(&self, proteins: &'a [Protein]) -> Option<&'a str> {
        let protein = proteins.get(self.protein_index as usize)?;
        let start = self.start as usize;
        protein.sequence.get(start..start + self.length as usize)
    }

    pub fn protein<'a>(&self, proteins: &'a [Protein]) -> Option<&'a Protein> {
        proteins.get(self.protein_index as usize)
    }

    /// Sequence with the variable modifications written in, eg. `PEPM[Oxidation]K`.
    pub fn annotated_sequence(
        &self,
        proteins: &[Protein],
        catalog: &ModificationCatalog,
    ) -> Option<String> {
        let sequence = self.sequence(proteins)?;
        let mods = self
            .var_mods
            .iter()
            .filter(|x| !x.is_empty())
            .map(|x| {
                let name = catalog
                    .by_type_id(x.type_id)
                    .map(|m| m.name.as_str())
                    .unwrap_or("?");
                (x.position, name)
            });
        Some(annotate_sequence(sequence, mods))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Modification,
        ModificationList,
        ModificationPosition,
    };

    #[test]
    fn test_resolve_candidate() {
        let proteins = vec![Protein::new("P1", "MPEPMTIDEK")];
        let catalog = ModificationCatalog::new(&[ModificationList {
            name: "var".into(),
            modifications: vec![Modification::new(
                "Oxidation",
                Some('M'),
                ModificationPosition::Residue,
                15.994915,
            )],
            fixed: false,
            variable: true,
            localize: false,
        }])
        .unwrap();
        let mut cand = Candidate {
            protein_index: 0,
            start: 1,
            length: 9,
            decoy: false,
            monoisotopic_mass: 0.0,
            var_mods: [VarModSlot::default(); NUM_VAR_MOD_SLOTS],
        };
        assert_eq!(cand.sequence(&proteins), Some("PEPMTIDEK"));
        assert_eq!(cand.num_var_mods(), 0);

        // M is residue 3 of the peptide -> position 5
        cand.var_mods[0] = VarModSlot {
            type_id: 1,
            position: 5,
        };
        assert_eq!(cand.num_var_mods(), 1);
        assert_eq!(
            cand.annotated_sequence(&proteins, &catalog).unwrap(),
            "PEPM[Oxidation]TIDEK"
        );

        cand.protein_index = 4;
        assert!(cand.sequence(&proteins).is_none());
    }
}
