use super::timings::SearchTimings;
use crate::errors::Result;
use crate::models::{
    Candidate,
    ModificationCatalog,
    Ms2Scan,
    Protein,
};
use serde::Serialize;
use std::io::Write;

/// Best candidate for one scan under one search mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchResult {
    pub scan_id: u32,
    pub candidate_index: u32,
    pub score: f32,
    /// Position of the search mode in the configured list.
    pub search_mode: usize,
    /// Window of the search mode that accepted the mass difference.
    pub notch: usize,
    pub precursor_mass: f64,
    /// Precursor mass minus candidate mass.
    pub mass_difference: f64,
}

/// Output of searching a batch of scans.
#[derive(Debug, Clone)]
pub struct SearchResults {
    /// `per_mode[mode][scan]`, scans in input order.
    pub per_mode: Vec<Vec<Option<MatchResult>>>,
    /// File key of every mode, same order as `per_mode`.
    pub mode_keys: Vec<String>,
    pub timings: SearchTimings,
}

#[derive(Debug, Serialize)]
struct PsmRow<'a> {
    scan: u32,
    precursor_mass: f64,
    charge: Option<u8>,
    rt: Option<f32>,
    sequence: String,
    protein: &'a str,
    decoy: bool,
    score: f32,
    notch: usize,
    mass_difference: f64,
}

impl SearchResults {
    pub fn num_modes(&self) -> usize {
        self.per_mode.len()
    }

    /// Number of scans with a match, per mode.
    pub fn match_counts(&self) -> Vec<usize> {
        self.per_mode
            .iter()
            .map(|x| x.iter().filter(|m| m.is_some()).count())
            .collect()
    }

    pub fn matches(&self, mode: usize) -> impl Iterator<Item = &MatchResult> {
        self.per_mode
            .get(mode)
            .into_iter()
            .flat_map(|x| x.iter().flatten())
    }

    /// Writes the matches of one mode as a tab separated table.
    ///
    /// `scans` has to be the batch the results were computed from. Returns
    /// the number of rows written.
    pub fn write_tsv<W: Write>(
        &self,
        mode: usize,
        writer: W,
        scans: &[Ms2Scan],
        candidates: &[Candidate],
        proteins: &[Protein],
        catalog: &ModificationCatalog,
    ) -> Result<usize> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(writer);
        let mut written = 0;
        let Some(mode_matches) = self.per_mode.get(mode) else {
            return Ok(0);
        };
        for (scan, m) in scans.iter().zip(mode_matches.iter()) {
            let Some(m) = m else { continue };
            let candidate = &candidates[m.candidate_index as usize];
            let row = PsmRow {
                scan: m.scan_id,
                precursor_mass: m.precursor_mass,
                charge: scan.precursor_charge,
                rt: scan.retention_time_seconds,
                sequence: candidate
                    .annotated_sequence(proteins, catalog)
                    .unwrap_or_default(),
                protein: candidate
                    .protein(proteins)
                    .map(|p| p.accession.as_str())
                    .unwrap_or(""),
                decoy: candidate.decoy,
                score: m.score,
                notch: m.notch,
                mass_difference: m.mass_difference,
            };
            wtr.serialize(row)?;
            written += 1;
        }
        wtr.flush()?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VarModSlot;

    #[test]
    fn test_write_tsv() {
        let proteins = vec![Protein::new("sp|P1|TEST", "PEPTIDEK")];
        let candidates = vec![Candidate {
            protein_index: 0,
            start: 0,
            length: 8,
            decoy: false,
            monoisotopic_mass: 927.455,
            var_mods: [VarModSlot::default(); 3],
        }];
        let scans = vec![
            Ms2Scan::try_new(1, vec![], vec![], 927.46)
                .unwrap()
                .with_precursor_charge(2),
            Ms2Scan::try_new(2, vec![], vec![], 500.0).unwrap(),
        ];
        let results = SearchResults {
            per_mode: vec![vec![
                Some(MatchResult {
                    scan_id: 1,
                    candidate_index: 0,
                    score: 3.5,
                    search_mode: 0,
                    notch: 0,
                    precursor_mass: 927.46,
                    mass_difference: 0.005,
                }),
                None,
            ]],
            mode_keys: vec!["open".into()],
            timings: SearchTimings::default(),
        };
        assert_eq!(results.match_counts(), vec![1]);

        let mut out = Vec::new();
        let written = results
            .write_tsv(0, &mut out, &scans, &candidates, &proteins, &ModificationCatalog::default())
            .unwrap();
        assert_eq!(written, 1);
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "scan\tprecursor_mass\tcharge\trt\tsequence\tprotein\tdecoy\tscore\tnotch\tmass_difference"
        );
        let row: Vec<&str> = lines.next().unwrap().split('\t').collect();
        assert_eq!(row[0], "1");
        assert_eq!(row[2], "2");
        assert_eq!(row[3], "");
        assert_eq!(row[4], "PEPTIDEK");
        assert_eq!(row[5], "sp|P1|TEST");
        assert_eq!(row[6], "false");
        assert!(lines.next().is_none());
    }
}
