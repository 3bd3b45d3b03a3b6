//! Fixed modification placement and variable modification isoform
//! enumeration for a single peptide backbone.
//!
//! Positions use the "two-based" scheme shared with [`crate::models::VarModSlot`]:
//! `0` protein N-terminus, `1` peptide N-terminus, `r + 2` residue `r`,
//! `L + 2` peptide C-terminus and `L + 3` protein C-terminus.

use crate::chemistry::WATER;
use crate::models::{
    DigestSlice,
    Modification,
    ModificationCatalog,
    ModificationPosition,
    NUM_VAR_MOD_SLOTS,
    Protein,
};
use arrayvec::ArrayVec;

pub const MAX_MODS_PER_PEPTIDE: usize = NUM_VAR_MOD_SLOTS;

/// (position, type id) pairs, ascending by position.
pub type ModPattern = ArrayVec<(u8, u16), MAX_MODS_PER_PEPTIDE>;

/// Borrowed view of a peptide with per-position mass shifts.
#[derive(Debug, Clone, Copy)]
pub struct ModifiedPeptide<'a> {
    pub sequence: &'a str,
    residue_masses: &'a [f64],
    shifts: &'a [f64],
}

impl<'a> ModifiedPeptide<'a> {
    /// `shifts` must have one entry per two-based position (`len + 4`).
    pub fn new(sequence: &'a str, residue_masses: &'a [f64], shifts: &'a [f64]) -> Self {
        debug_assert_eq!(sequence.len(), residue_masses.len());
        debug_assert_eq!(sequence.len() + 4, shifts.len());
        Self {
            sequence,
            residue_masses,
            shifts,
        }
    }

    pub fn len(&self) -> usize {
        self.residue_masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residue_masses.is_empty()
    }

    pub fn n_term_shift(&self) -> f64 {
        self.shifts[0] + self.shifts[1]
    }

    pub fn c_term_shift(&self) -> f64 {
        let len = self.len();
        self.shifts[len + 2] + self.shifts[len + 3]
    }

    pub fn residue_mass_with_mods(&self, residue: usize) -> f64 {
        self.residue_masses[residue] + self.shifts[residue + 2]
    }

    pub fn monoisotopic_mass(&self) -> f64 {
        self.residue_masses.iter().sum::<f64>() + self.shifts.iter().sum::<f64>() + WATER
    }
}

/// Where the modifications of a catalog can go on one backbone.
#[derive(Debug, Clone, Default)]
pub struct ModificationSites {
    len: usize,
    /// (position, index into `catalog.fixed`)
    fixed: Vec<(u8, usize)>,
    /// Modifiable positions and the type ids that fit there.
    variable: Vec<(u8, Vec<u16>)>,
    has_localized: bool,
}

fn position_matches(
    modification: &Modification,
    digest: &DigestSlice,
    residues: &[u8],
) -> Vec<u8> {
    let len = residues.len();
    let first = residues[0] as char;
    let last = residues[len - 1] as char;
    match modification.position {
        ModificationPosition::ProteinNTerm => {
            if digest.is_protein_n_term() && modification.targets(first) {
                vec![0]
            } else {
                vec![]
            }
        }
        ModificationPosition::PeptideNTerm => {
            if modification.targets(first) {
                vec![1]
            } else {
                vec![]
            }
        }
        ModificationPosition::Residue => residues
            .iter()
            .enumerate()
            .filter(|(_, res)| modification.targets(**res as char))
            .map(|(r, _)| (r + 2) as u8)
            .collect(),
        ModificationPosition::PeptideCTerm => {
            if modification.targets(last) {
                vec![(len + 2) as u8]
            } else {
                vec![]
            }
        }
        ModificationPosition::ProteinCTerm => {
            if digest.is_protein_c_term() && modification.targets(last) {
                vec![(len + 3) as u8]
            } else {
                vec![]
            }
        }
    }
}

impl ModificationSites {
    pub fn new(digest: &DigestSlice, protein: &Protein, catalog: &ModificationCatalog) -> Self {
        let residues = digest.sequence().as_bytes();
        let len = residues.len();
        let mut out = Self {
            len,
            ..Default::default()
        };
        if len == 0 {
            return out;
        }

        for (i, m) in catalog.fixed.iter().enumerate() {
            for pos in position_matches(m, digest, residues) {
                out.fixed.push((pos, i));
            }
        }

        for (i, m) in catalog.variable.iter().enumerate() {
            for pos in position_matches(m, digest, residues) {
                out.add_variable(pos, catalog.variable_type_id(i), catalog);
            }
        }

        let start = digest.start();
        for (one_based, mod_indices) in protein
            .localized_modifications
            .range((start + 1)..=(start + len))
        {
            let r = one_based - start - 1;
            for &idx in mod_indices {
                let Some(m) = catalog.localizable.get(idx) else {
                    continue;
                };
                let pos = match m.position {
                    ModificationPosition::ProteinNTerm if r == 0 && digest.is_protein_n_term() => 0,
                    ModificationPosition::PeptideNTerm if r == 0 => 1,
                    ModificationPosition::Residue => r + 2,
                    ModificationPosition::PeptideCTerm if r == len - 1 => len + 2,
                    ModificationPosition::ProteinCTerm
                        if r == len - 1 && digest.is_protein_c_term() =>
                    {
                        len + 3
                    }
                    _ => continue,
                };
                out.has_localized = true;
                out.add_variable(pos as u8, catalog.localizable_type_id(idx), catalog);
            }
        }

        out.variable.sort_unstable_by_key(|x| x.0);
        out
    }

    fn add_variable(&mut self, position: u8, type_id: u16, catalog: &ModificationCatalog) {
        let new_mod = catalog.by_type_id(type_id);
        match self.variable.iter_mut().find(|x| x.0 == position) {
            Some((_, ids)) => {
                if !ids.iter().any(|x| catalog.by_type_id(*x) == new_mod) {
                    ids.push(type_id);
                }
            }
            None => self.variable.push((position, vec![type_id])),
        }
    }

    /// True if a database-annotated (localizable) site falls on this peptide.
    pub fn has_localized(&self) -> bool {
        self.has_localized
    }

    pub fn num_variable_sites(&self) -> usize {
        self.variable.len()
    }

    /// Per-position mass shifts for one isoform: all fixed modifications plus
    /// the ones in `pattern`. `out` ends up with `len + 4` entries.
    pub fn position_shifts(
        &self,
        pattern: &ModPattern,
        catalog: &ModificationCatalog,
        out: &mut Vec<f64>,
    ) {
        out.clear();
        out.resize(self.len + 4, 0.0);
        for (pos, idx) in self.fixed.iter() {
            out[*pos as usize] += catalog.fixed[*idx].mass_shift;
        }
        for (pos, type_id) in pattern.iter() {
            if let Some(m) = catalog.by_type_id(*type_id) {
                out[*pos as usize] += m.mass_shift;
            }
        }
    }

    /// Calls `f` for every isoform, fewest modifications first, stopping once
    /// `max_isoforms` have been produced. Each position carries at most one
    /// variable modification.
    pub fn for_each_isoform<F: FnMut(&ModPattern)>(&self, max_isoforms: usize, mut f: F) {
        let max_mods = self.variable.len().min(MAX_MODS_PER_PEPTIDE);
        let mut pattern = ModPattern::new();
        let mut emitted = 0;
        for num_mods in 0..=max_mods {
            if !self.place(0, num_mods, &mut pattern, &mut emitted, max_isoforms, &mut f) {
                return;
            }
        }
    }

    /// Returns false once the cap is hit.
    fn place<F: FnMut(&ModPattern)>(
        &self,
        first_site: usize,
        remaining: usize,
        pattern: &mut ModPattern,
        emitted: &mut usize,
        max_isoforms: usize,
        f: &mut F,
    ) -> bool {
        if remaining == 0 {
            if *emitted >= max_isoforms {
                return false;
            }
            f(pattern);
            *emitted += 1;
            return true;
        }
        for site in first_site..self.variable.len() {
            if self.variable.len() - site < remaining {
                break;
            }
            let (pos, ids) = &self.variable[site];
            for id in ids.iter() {
                pattern.push((*pos, *id));
                let keep_going =
                    self.place(site + 1, remaining - 1, pattern, emitted, max_isoforms, f);
                pattern.pop();
                if !keep_going {
                    return false;
                }
            }
        }
        true
    }

    /// Sequence with every fixed and pattern modification written in.
    pub fn modified_sequence(
        &self,
        sequence: &str,
        pattern: &ModPattern,
        catalog: &ModificationCatalog,
    ) -> String {
        let fixed = self
            .fixed
            .iter()
            .map(|(pos, idx)| (*pos, catalog.fixed[*idx].name.as_str()));
        let variable = pattern.iter().filter_map(|(pos, id)| {
            catalog
                .by_type_id(*id)
                .map(|m| (*pos, m.name.as_str()))
        });
        annotate_sequence(sequence, fixed.chain(variable))
    }
}

/// Writes modification names into a sequence, eg. `[Acetyl]-PEPM[Oxidation]K`.
pub fn annotate_sequence<'a>(sequence: &str, mods: impl Iterator<Item = (u8, &'a str)>) -> String {
    let len = sequence.len();
    let mut mods: Vec<(u8, &str)> = mods.collect();
    mods.sort_unstable();

    let mut out = String::with_capacity(len + 16 * mods.len());
    for (_, name) in mods.iter().filter(|x| x.0 < 2) {
        out.push('[');
        out.push_str(name);
        out.push_str("]-");
    }
    for (r, residue) in sequence.chars().enumerate() {
        out.push(residue);
        for (_, name) in mods.iter().filter(|x| x.0 as usize == r + 2) {
            out.push('[');
            out.push_str(name);
            out.push(']');
        }
    }
    for (_, name) in mods.iter().filter(|x| x.0 as usize >= len + 2) {
        out.push_str("-[");
        out.push_str(name);
        out.push(']');
    }
    out
}
