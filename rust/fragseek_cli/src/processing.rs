use fragseek::indexing::IndexBuildStats;
use fragseek::scoring::SearchTimings;
use fragseek::{
    Candidate,
    CandidateBuilder,
    FragmentIndex,
    IndexCache,
    IndexSignature,
    ModificationCatalog,
    Ms2Scan,
    Protein,
    SearchEngine,
    SearchResults,
};
use indicatif::{
    ProgressIterator,
    ProgressStyle,
};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::config::Config;
use crate::errors::CliError;
use crate::inputs::{
    read_mgf,
    read_modification_catalog,
    read_proteins,
};

#[derive(Debug, Serialize)]
struct ModeSummary<'a> {
    name: &'a str,
    matched_scans: usize,
    target_matches: usize,
    decoy_matches: usize,
    output_file: String,
}

#[derive(Debug, Serialize)]
struct SearchSummary<'a> {
    signature: &'a str,
    num_proteins: usize,
    num_candidates: usize,
    num_fragment_keys: usize,
    num_scans: usize,
    /// Only present when the index was built in this run.
    index_build_stats: Option<IndexBuildStats>,
    timings: SearchTimings,
    modes: Vec<ModeSummary<'a>>,
}

struct LoadedIndex {
    candidates: Vec<Candidate>,
    fragment_index: FragmentIndex,
    stats: Option<IndexBuildStats>,
}

fn build_or_load_index(
    config: &Config,
    signature: &IndexSignature,
    proteins: &[Protein],
    catalog: &ModificationCatalog,
    no_cache: bool,
) -> Result<LoadedIndex, CliError> {
    let params = config.indexing_parameters()?;
    let builder = CandidateBuilder::new(proteins, catalog, &params).with_progress(true);

    let cache = match (&config.cache_directory, no_cache) {
        (Some(dir), false) => IndexCache::new(dir),
        _ => {
            info!("Index cache disabled, building from scratch");
            let built = builder.build()?;
            return Ok(LoadedIndex {
                candidates: built.candidates,
                fragment_index: built.fragment_index,
                stats: Some(built.stats),
            });
        }
    };

    let mut stats = None;
    let (candidates, fragment_index) = cache.load_or_build(signature, || {
        let built = builder.build()?;
        stats = Some(built.stats);
        Ok(built)
    })?;
    Ok(LoadedIndex {
        candidates,
        fragment_index,
        stats,
    })
}

fn write_outputs(
    out_dir: &Path,
    results: &SearchResults,
    scans: &[Ms2Scan],
    candidates: &[Candidate],
    proteins: &[Protein],
    catalog: &ModificationCatalog,
) -> Result<Vec<(String, usize)>, CliError> {
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
    )
    .map_err(|e| CliError::Config {
        source: e.to_string(),
    })?;

    let mut written = Vec::with_capacity(results.num_modes());
    for (mode, key) in results.mode_keys.iter().enumerate().progress_with_style(style) {
        let path = out_dir.join(format!("{}.psms.tsv", key));
        let file = File::create(&path).map_err(|e| CliError::io(e, &path))?;
        let nrows = results.write_tsv(
            mode,
            BufWriter::new(file),
            scans,
            candidates,
            proteins,
            catalog,
        )?;
        info!("Wrote {} matches to {}", nrows, path.display());
        written.push((path.to_string_lossy().to_string(), nrows));
    }
    Ok(written)
}

pub fn run(config: &Config, no_cache: bool) -> Result<(), CliError> {
    let start = Instant::now();
    let out_dir = match &config.output {
        Some(x) => x.directory.clone(),
        None => {
            return Err(CliError::Config {
                source: "No output directory configured".to_string(),
            });
        }
    };
    let spectra_path = match &config.input.spectra {
        Some(x) => x.clone(),
        None => {
            return Err(CliError::Config {
                source: "No spectra configured".to_string(),
            });
        }
    };
    std::fs::create_dir_all(&out_dir).map_err(|e| CliError::io(e, &out_dir))?;

    let catalog = read_modification_catalog(&config.modifications)?;
    let proteins = read_proteins(
        &config.input.databases,
        &catalog,
        config.digestion.build_decoys,
    )?;
    let params = config.indexing_parameters()?;
    let signature = IndexSignature::new(
        &config.input.databases,
        config.digestion.build_decoys,
        &catalog,
        &params,
    );
    info!("Index signature: {}", signature);

    let index = build_or_load_index(config, &signature, &proteins, &catalog, no_cache)?;
    let scans = read_mgf(&spectra_path)?;
    if scans.is_empty() {
        return Err(CliError::DataReading {
            source: format!("No usable spectra in {}", spectra_path.display()),
        });
    }

    let modes = &config.search.search_modes;
    let engine = SearchEngine::new(
        &index.candidates,
        &index.fragment_index,
        modes,
        &config.search_parameters(),
    )?;
    let results = engine.process_batch(&scans)?;

    let written = write_outputs(
        &out_dir,
        &results,
        &scans,
        &index.candidates,
        &proteins,
        &catalog,
    )?;

    let mode_summaries = results
        .mode_keys
        .iter()
        .enumerate()
        .zip(written)
        .map(|((mode, key), (output_file, matched_scans))| {
            let decoy_matches = results
                .matches(mode)
                .filter(|m| index.candidates[m.candidate_index as usize].decoy)
                .count();
            ModeSummary {
                name: key,
                matched_scans,
                target_matches: matched_scans - decoy_matches,
                decoy_matches,
                output_file,
            }
        })
        .collect();

    let summary = SearchSummary {
        signature: signature.as_str(),
        num_proteins: proteins.len(),
        num_candidates: index.candidates.len(),
        num_fragment_keys: index.fragment_index.len(),
        num_scans: scans.len(),
        index_build_stats: index.stats,
        timings: results.timings,
        modes: mode_summaries,
    };
    let summary_path = out_dir.join("search_summary.json");
    let file = File::create(&summary_path).map_err(|e| CliError::io(e, &summary_path))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &summary)?;

    info!(
        "Searched {} spectra against {} candidates in {:?}, results in {}",
        scans.len(),
        index.candidates.len(),
        start.elapsed(),
        out_dir.display()
    );
    Ok(())
}
