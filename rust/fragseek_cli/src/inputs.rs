//! Readers for the files the search consumes: protein databases (FASTA or
//! NDJSON), modification lists (JSON) and spectra (MGF).

use fragseek::chemistry::PROTON;
use fragseek::{
    Modification,
    ModificationCatalog,
    ModificationList,
    Ms2Scan,
    Protein,
};
use mzdata::io::mgf::MGFReader;
use mzdata::prelude::*;
use mzdata::spectrum::MultiLayerSpectrum;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{
    BufRead,
    BufReader,
    Read,
};
use std::path::Path;
use std::time::Instant;
use tracing::{
    debug,
    info,
    warn,
};

use crate::config::ModificationListConfig;
use crate::errors::CliError;

fn open(path: &Path) -> Result<BufReader<File>, CliError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| CliError::io(e, path))
}

/// Accession from a FASTA header line (without the leading `>`).
///
/// UniProt style headers (`sp|P12345|NAME_HUMAN ...`) yield the middle field,
/// anything else the first whitespace separated word.
fn header_accession(header: &str, uniprot: &Regex) -> String {
    if let Some(caps) = uniprot.captures(header) {
        return caps[1].to_string();
    }
    header
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}

pub fn parse_fasta<R: BufRead>(reader: R) -> Result<Vec<Protein>, CliError> {
    let uniprot = Regex::new(r"^(?:sp|tr)\|([^|]+)\|").map_err(|e| CliError::ParseError {
        msg: e.to_string(),
    })?;

    let mut out = Vec::new();
    let mut accession: Option<String> = None;
    let mut sequence = String::new();
    for line in reader.lines() {
        let line = line.map_err(|e| CliError::Io {
            source: e.to_string(),
            path: None,
        })?;
        let line = line.trim();
        if let Some(header) = line.strip_prefix('>') {
            if let Some(acc) = accession.take() {
                out.push(Protein::new(acc, &sequence));
            }
            accession = Some(header_accession(header, &uniprot));
            sequence.clear();
        } else if !line.is_empty() {
            if accession.is_none() {
                return Err(CliError::ParseError {
                    msg: "FASTA sequence found before any header".to_string(),
                });
            }
            sequence.push_str(line);
        }
    }
    if let Some(acc) = accession {
        out.push(Protein::new(acc, &sequence));
    }
    Ok(out)
}

/// One line of an NDJSON protein database.
///
/// `sites` maps one-based residue positions to names of localizable
/// modifications.
#[derive(Debug, Deserialize)]
pub struct ProteinEntry {
    pub accession: String,
    pub sequence: String,
    #[serde(default)]
    pub sites: BTreeMap<usize, Vec<String>>,
}

impl ProteinEntry {
    fn into_protein(self, catalog: &ModificationCatalog) -> Protein {
        let mut sites: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (position, names) in self.sites {
            for name in names {
                match catalog.localizable_index(&name) {
                    Some(idx) => sites.entry(position).or_default().push(idx),
                    None => debug!(
                        "Ignoring site {} of {}: {:?} is not a localizable modification",
                        position, self.accession, name
                    ),
                }
            }
        }
        Protein::new(self.accession, &self.sequence).with_localized_modifications(sites)
    }
}

pub fn parse_protein_ndjson<R: BufRead>(
    reader: R,
    catalog: &ModificationCatalog,
) -> Result<Vec<Protein>, CliError> {
    let mut out = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| CliError::Io {
            source: e.to_string(),
            path: None,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: ProteinEntry = serde_json::from_str(&line).map_err(|e| CliError::ParseError {
            msg: format!("line {}: {}", i + 1, e),
        })?;
        out.push(entry.into_protein(catalog));
    }
    Ok(out)
}

/// Reads every database, adding reversed decoys when asked to.
pub fn read_proteins(
    paths: &[std::path::PathBuf],
    catalog: &ModificationCatalog,
    build_decoys: bool,
) -> Result<Vec<Protein>, CliError> {
    let st = Instant::now();
    let mut proteins = Vec::new();
    for path in paths {
        let is_ndjson = path
            .extension()
            .is_some_and(|x| x.eq_ignore_ascii_case("ndjson"));
        let reader = open(path)?;
        let mut read = if is_ndjson {
            parse_protein_ndjson(reader, catalog)?
        } else {
            parse_fasta(reader)?
        };
        info!("Read {} proteins from {}", read.len(), path.display());
        proteins.append(&mut read);
    }

    if build_decoys {
        let decoys: Vec<Protein> = proteins.iter().map(|x| x.reversed_decoy()).collect();
        proteins.extend(decoys);
    }
    info!(
        "Loaded {} proteins (decoys: {}) in {:?}",
        proteins.len(),
        build_decoys,
        st.elapsed()
    );
    Ok(proteins)
}

/// Reads the modification list files into a catalog. Each list is named
/// after its file stem.
pub fn read_modification_catalog(
    configs: &[ModificationListConfig],
) -> Result<ModificationCatalog, CliError> {
    let mut lists = Vec::with_capacity(configs.len());
    for conf in configs {
        let mut text = String::new();
        open(&conf.path)?
            .read_to_string(&mut text)
            .map_err(|e| CliError::io(e, &conf.path))?;
        let modifications: Vec<Modification> = serde_json::from_str(&text)?;
        let name = conf
            .path
            .file_stem()
            .map(|x| x.to_string_lossy().to_string())
            .unwrap_or_default();
        info!(
            "Read {} modifications from list {} (fixed: {}, variable: {}, localize: {})",
            modifications.len(),
            name,
            conf.fixed,
            conf.variable,
            conf.localize
        );
        lists.push(ModificationList {
            name,
            modifications,
            fixed: conf.fixed,
            variable: conf.variable,
            localize: conf.localize,
        });
    }
    Ok(ModificationCatalog::new(&lists)?)
}

/// Converts a positive precursor charge state. Negative mode spectra are not
/// searched since fragments are scored as protonated ions.
fn positive_charge(charge: Option<i32>) -> Option<u8> {
    charge
        .filter(|z| *z > 0)
        .and_then(|z| u8::try_from(z).ok())
}

fn spectrum_to_scan(spectrum: &MultiLayerSpectrum) -> Option<Ms2Scan> {
    let scan_id = (spectrum.index() + 1) as u32;
    if spectrum.ms_level() != 2 {
        debug!("Skipping spectrum {} at MS level {}", scan_id, spectrum.ms_level());
        return None;
    }
    let Some(ion) = spectrum.precursor().and_then(|p| p.ions.first()) else {
        warn!("Skipping spectrum {} ({}) without precursor", scan_id, spectrum.id());
        return None;
    };
    if ion.mz <= 0.0 {
        warn!("Skipping spectrum {} ({}) without PEPMASS", scan_id, spectrum.id());
        return None;
    }
    let Some(charge) = positive_charge(ion.charge) else {
        warn!(
            "Skipping spectrum {} ({}) with unusable precursor charge {:?}",
            scan_id,
            spectrum.id(),
            ion.charge
        );
        return None;
    };
    let precursor_mass = (ion.mz - PROTON) * charge as f64;

    let mut peaks: Vec<(f64, f32)> = spectrum
        .peaks()
        .iter()
        .map(|p| (p.mz, p.intensity))
        .collect();
    peaks.sort_by(|a, b| a.0.total_cmp(&b.0));
    let (mz, intensity) = peaks.into_iter().unzip();

    match Ms2Scan::try_new(scan_id, mz, intensity, precursor_mass) {
        Ok(scan) => {
            let scan = scan.with_precursor_charge(charge);
            // Reported in minutes, zero when the file carries no RTINSECONDS.
            let rt_minutes = spectrum.start_time();
            Some(if rt_minutes > 0.0 {
                scan.with_retention_time((rt_minutes * 60.0) as f32)
            } else {
                scan
            })
        }
        Err(e) => {
            warn!("Skipping invalid spectrum {}: {:?}", scan_id, e);
            None
        }
    }
}

/// Parses an MGF stream. Spectra without a usable precursor are skipped.
///
/// Scans are numbered by their one-based position in the file.
pub fn parse_mgf<R: Read>(reader: R) -> Vec<Ms2Scan> {
    let reader = MGFReader::new(reader);
    let mut num_spectra = 0;
    let scans: Vec<Ms2Scan> = reader
        .inspect(|_| num_spectra += 1)
        .filter_map(|spectrum| spectrum_to_scan(&spectrum))
        .collect();
    if scans.len() < num_spectra {
        warn!(
            "Skipped {} of {} spectra",
            num_spectra - scans.len(),
            num_spectra
        );
    }
    scans
}

pub fn read_mgf(path: &Path) -> Result<Vec<Ms2Scan>, CliError> {
    let st = Instant::now();
    let scans = parse_mgf(open(path)?);
    info!(
        "Read {} spectra from {} in {:?}",
        scans.len(),
        path.display(),
        st.elapsed()
    );
    Ok(scans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fragseek::models::ModificationPosition;

    #[test]
    fn test_parse_fasta() {
        let text = ">sp|P12345|TEST_HUMAN Some protein\nMPEP\nTIDEK\n\n>custom_1 other\nAAAR\n";
        let proteins = parse_fasta(text.as_bytes()).unwrap();
        assert_eq!(proteins.len(), 2);
        assert_eq!(proteins[0].accession, "P12345");
        assert_eq!(proteins[0].sequence.as_ref(), "MPEPTIDEK");
        assert_eq!(proteins[1].accession, "custom_1");
        assert_eq!(proteins[1].sequence.as_ref(), "AAAR");

        assert!(parse_fasta("PEPTIDEK\n".as_bytes()).is_err());
    }

    #[test]
    fn test_parse_ndjson_resolves_sites() {
        let catalog = ModificationCatalog::new(&[ModificationList {
            name: "loc".into(),
            modifications: vec![Modification::new(
                "Phospho",
                Some('S'),
                ModificationPosition::Residue,
                79.966331,
            )],
            fixed: false,
            variable: false,
            localize: true,
        }])
        .unwrap();
        let text = concat!(
            r#"{"accession": "P1", "sequence": "PEPSIDEK", "sites": {"4": ["Phospho", "Unknown"]}}"#,
            "\n\n",
            r#"{"accession": "P2", "sequence": "AAAR"}"#,
            "\n"
        );
        let proteins = parse_protein_ndjson(text.as_bytes(), &catalog).unwrap();
        assert_eq!(proteins.len(), 2);
        assert_eq!(proteins[0].localized_modifications.get(&4), Some(&vec![0]));
        assert!(proteins[1].localized_modifications.is_empty());
    }

    #[test]
    fn test_ndjson_site_past_the_end_is_dropped() {
        let catalog = ModificationCatalog::new(&[ModificationList {
            name: "loc".into(),
            modifications: vec![Modification::new(
                "Phospho",
                Some('S'),
                ModificationPosition::Residue,
                79.966331,
            )],
            fixed: false,
            variable: false,
            localize: true,
        }])
        .unwrap();
        let text = r#"{"accession": "P1", "sequence": "PEPSIDEK", "sites": {"20": ["Phospho"], "4": ["Phospho"]}}"#;
        let proteins = parse_protein_ndjson(text.as_bytes(), &catalog).unwrap();
        assert_eq!(proteins[0].localized_modifications.len(), 1);

        let decoy = proteins[0].reversed_decoy();
        assert_eq!(decoy.localized_modifications.get(&5), Some(&vec![0]));
    }

    #[test]
    fn test_parse_mgf() {
        let text = "\
BEGIN IONS
TITLE=first
PEPMASS=500.5 1000
CHARGE=2+
RTINSECONDS=12.5
300.2 20
200.1 10
END IONS
BEGIN IONS
TITLE=no charge
PEPMASS=400.0
100.0 1
END IONS
BEGIN IONS
TITLE=negative
PEPMASS=500.0
CHARGE=2-
100.0 1
END IONS
BEGIN IONS
TITLE=third
PEPMASS=600.0
CHARGE=3+
150.0 5
END IONS
";
        let scans = parse_mgf(std::io::Cursor::new(text.as_bytes()));
        assert_eq!(scans.len(), 2);

        let first = &scans[0];
        assert_eq!(first.scan_id, 1);
        assert_eq!(first.precursor_charge, Some(2));
        let rt = first.retention_time_seconds.unwrap();
        assert!((rt - 12.5).abs() < 1e-3);
        assert_eq!(first.mz, vec![200.1, 300.2]);
        assert_eq!(first.intensity, vec![10.0, 20.0]);
        assert!((first.precursor_mass - (500.5 - PROTON) * 2.0).abs() < 1e-6);

        // Numbered by position, counting the skipped spectra.
        assert_eq!(scans[1].scan_id, 4);
        assert_eq!(scans[1].precursor_charge, Some(3));
        assert_eq!(scans[1].retention_time_seconds, None);
    }

    #[test]
    fn test_negative_charge_is_not_searched() {
        assert_eq!(positive_charge(Some(2)), Some(2));
        assert_eq!(positive_charge(Some(-2)), None);
        assert_eq!(positive_charge(Some(0)), None);
        assert_eq!(positive_charge(Some(300)), None);
        assert_eq!(positive_charge(None), None);
    }
}
