//! Parallel construction of the candidate list and its fragment index.
//!
//! Proteins are split into contiguous partitions that are processed in
//! parallel. Within a partition all the expensive work (digestion, isoform
//! enumeration, fragment generation, index insertion) happens without locks.
//! The only shared, locked state is:
//!
//! - the two deduplication sets (backbones and fully modified sequences),
//! - the candidate list, where appending hands out the candidate id,
//! - the global fragment index builder, which each partition merges its local
//!   builder into exactly once, when it is done.
//!
//! Candidate ids are stable once handed out but the order in which partitions
//! append is not deterministic. Nothing downstream depends on it.

use super::fragment_index::{
    FragmentIndex,
    FragmentIndexBuilder,
};
use super::modified_peptide::{
    ModPattern,
    ModificationSites,
    ModifiedPeptide,
};
use crate::chemistry::residue_mass;
use crate::digestion::{
    DigestionParameters,
    digest_protein,
};
use crate::errors::{
    ConfigurationError,
    FragSeekError,
    Result,
};
use crate::fragment_mass::{
    DEFAULT_MAX_FRAGMENT_MASS,
    FragmentMassBuilder,
    IonType,
};
use crate::models::{
    Candidate,
    ModificationCatalog,
    NUM_VAR_MOD_SLOTS,
    Protein,
    VarModSlot,
};
use indicatif::{
    ParallelProgressIterator,
    ProgressBar,
    ProgressStyle,
};
use rayon::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::HashSet;
use std::fmt::Display;
use std::sync::{
    Mutex,
    MutexGuard,
};
use std::time::Instant;
use tracing::{
    debug,
    info,
};

pub const DEFAULT_MAX_ISOFORMS: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexingParameters {
    pub digestion: DigestionParameters,
    /// Maximum number of modified forms generated per backbone.
    pub max_isoforms: usize,
    pub ion_types: Vec<IonType>,
    pub max_fragment_mass: f64,
}

impl Default for IndexingParameters {
    fn default() -> Self {
        Self {
            digestion: DigestionParameters::default(),
            max_isoforms: DEFAULT_MAX_ISOFORMS,
            ion_types: vec![IonType::B, IonType::Y],
            max_fragment_mass: DEFAULT_MAX_FRAGMENT_MASS,
        }
    }
}

impl IndexingParameters {
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        self.digestion.validate()?;
        if self.max_isoforms == 0 {
            return Err(ConfigurationError::InvalidParameter {
                field: "max_isoforms",
                reason: "at least one isoform per peptide is needed".to_string(),
            });
        }
        if self.ion_types.is_empty() {
            return Err(ConfigurationError::InvalidParameter {
                field: "ion_types",
                reason: "no ion types requested".to_string(),
            });
        }
        if self.max_fragment_mass.is_nan() || self.max_fragment_mass <= 0.0 {
            return Err(ConfigurationError::InvalidParameter {
                field: "max_fragment_mass",
                reason: format!("{} is not a positive mass", self.max_fragment_mass),
            });
        }
        Ok(())
    }

    pub fn fragment_mass_builder(&self) -> FragmentMassBuilder {
        FragmentMassBuilder {
            ion_types: self.ion_types.clone(),
            max_fragment_mass: self.max_fragment_mass,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexBuildStats {
    pub proteins: usize,
    pub proteins_skipped: usize,
    pub peptides_skipped: usize,
    pub duplicates: usize,
    pub candidates: usize,
    pub fragment_keys: usize,
    pub fragment_entries: usize,
}

impl std::ops::AddAssign for IndexBuildStats {
    fn add_assign(&mut self, rhs: Self) {
        self.proteins += rhs.proteins;
        self.proteins_skipped += rhs.proteins_skipped;
        self.peptides_skipped += rhs.peptides_skipped;
        self.duplicates += rhs.duplicates;
        self.candidates += rhs.candidates;
        self.fragment_keys += rhs.fragment_keys;
        self.fragment_entries += rhs.fragment_entries;
    }
}

impl Display for IndexBuildStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "IndexBuildStats(proteins: {}, skipped proteins: {}, skipped peptides: {}, duplicates: {}, candidates: {}, fragment keys: {}, fragment entries: {})",
            self.proteins,
            self.proteins_skipped,
            self.peptides_skipped,
            self.duplicates,
            self.candidates,
            self.fragment_keys,
            self.fragment_entries,
        )
    }
}

/// Everything needed to search: the candidates and their fragment index.
#[derive(Debug, Clone)]
pub struct BuiltIndex {
    pub candidates: Vec<Candidate>,
    pub fragment_index: FragmentIndex,
    pub stats: IndexBuildStats,
}

struct SharedState {
    seen_backbones: Mutex<HashSet<String>>,
    seen_modified: Mutex<HashSet<String>>,
    candidates: Mutex<Vec<Candidate>>,
    fragment_index: Mutex<FragmentIndexBuilder>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, context: &str) -> Result<MutexGuard<'a, T>> {
    mutex.lock().map_err(|_| FragSeekError::WorkerFailed {
        context: format!("lock on {} poisoned", context),
    })
}

/// Per-partition scratch space, reused across proteins.
#[derive(Default)]
struct PartitionBuffers {
    digests: Vec<crate::models::DigestSlice>,
    residue_masses: Vec<f64>,
    patterns: Vec<ModPattern>,
    shifts: Vec<f64>,
    fragments: Vec<f64>,
}

pub struct CandidateBuilder<'a> {
    proteins: &'a [Protein],
    catalog: &'a ModificationCatalog,
    params: &'a IndexingParameters,
    fragment_builder: FragmentMassBuilder,
    show_progress: bool,
}

impl<'a> CandidateBuilder<'a> {
    pub fn new(
        proteins: &'a [Protein],
        catalog: &'a ModificationCatalog,
        params: &'a IndexingParameters,
    ) -> Self {
        Self {
            proteins,
            catalog,
            params,
            fragment_builder: params.fragment_mass_builder(),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn build(&self) -> Result<BuiltIndex> {
        if self.proteins.is_empty() {
            return Err(ConfigurationError::EmptyInput {
                context: "no proteins to digest",
            }
            .into());
        }
        self.params.validate()?;

        let st = Instant::now();
        let num_partitions = (rayon::current_num_threads() * 8).max(1);
        let partition_size = self.proteins.len().div_ceil(num_partitions).max(1);
        info!(
            "Building candidates for {} proteins in partitions of {}",
            self.proteins.len(),
            partition_size
        );

        let shared = SharedState {
            seen_backbones: Mutex::new(HashSet::new()),
            seen_modified: Mutex::new(HashSet::new()),
            candidates: Mutex::new(Vec::new()),
            fragment_index: Mutex::new(FragmentIndexBuilder::new()),
        };

        let progress = if self.show_progress {
            let style = ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar());
            ProgressBar::new(self.proteins.len().div_ceil(partition_size) as u64).with_style(style)
        } else {
            ProgressBar::hidden()
        };

        let partition_stats: Vec<IndexBuildStats> = self
            .proteins
            .par_chunks(partition_size)
            .enumerate()
            .progress_with(progress)
            .map(|(i, chunk)| self.process_partition(i * partition_size, chunk, &shared))
            .collect::<Result<Vec<_>>>()?;

        let mut stats = IndexBuildStats::default();
        for x in partition_stats {
            stats += x;
        }

        let candidates = shared
            .candidates
            .into_inner()
            .map_err(|_| FragSeekError::WorkerFailed {
                context: "candidate list poisoned".to_string(),
            })?;
        let fragment_index = shared
            .fragment_index
            .into_inner()
            .map_err(|_| FragSeekError::WorkerFailed {
                context: "fragment index poisoned".to_string(),
            })?
            .build();
        stats.fragment_keys = fragment_index.len();
        stats.fragment_entries = fragment_index.num_entries();

        info!("Index built in {:?} with stats: {}", st.elapsed(), stats);
        Ok(BuiltIndex {
            candidates,
            fragment_index,
            stats,
        })
    }

    #[cfg_attr(
        feature = "instrumentation",
        tracing::instrument(skip_all, level = "trace")
    )]
    fn process_partition(
        &self,
        first_protein: usize,
        proteins: &[Protein],
        shared: &SharedState,
    ) -> Result<IndexBuildStats> {
        let mut stats = IndexBuildStats::default();
        let mut local = FragmentIndexBuilder::new();
        let mut buffers = PartitionBuffers::default();

        for (offset, protein) in proteins.iter().enumerate() {
            if protein.is_empty() {
                debug!("Skipping protein {} with an empty sequence", protein.accession);
                stats.proteins_skipped += 1;
                continue;
            }
            stats.proteins += 1;
            self.process_protein(
                (first_protein + offset) as u32,
                protein,
                shared,
                &mut local,
                &mut buffers,
                &mut stats,
            )?;
        }

        lock(&shared.fragment_index, "fragment index")?.merge(local);
        Ok(stats)
    }

    fn process_protein(
        &self,
        protein_index: u32,
        protein: &Protein,
        shared: &SharedState,
        local: &mut FragmentIndexBuilder,
        buffers: &mut PartitionBuffers,
        stats: &mut IndexBuildStats,
    ) -> Result<()> {
        buffers.digests.clear();
        digest_protein(protein, &self.params.digestion, &mut buffers.digests);

        for digest in buffers.digests.iter() {
            let sequence = digest.sequence();
            buffers.residue_masses.clear();
            let known_residues = sequence.chars().all(|c| match residue_mass(c) {
                Some(m) => {
                    buffers.residue_masses.push(m);
                    true
                }
                None => false,
            });
            if !known_residues {
                stats.peptides_skipped += 1;
                continue;
            }

            let sites = ModificationSites::new(digest, protein, self.catalog);
            if !sites.has_localized()
                && !lock(&shared.seen_backbones, "backbone set")?.insert(digest.leucine_sequence())
            {
                stats.duplicates += 1;
                continue;
            }

            buffers.patterns.clear();
            sites.for_each_isoform(self.params.max_isoforms, |p| buffers.patterns.push(p.clone()));

            for pattern in buffers.patterns.iter() {
                if sites.has_localized() {
                    let key = sites.modified_sequence(sequence, pattern, self.catalog);
                    if !lock(&shared.seen_modified, "modified sequence set")?.insert(key) {
                        stats.duplicates += 1;
                        continue;
                    }
                }

                sites.position_shifts(pattern, self.catalog, &mut buffers.shifts);
                let peptide = ModifiedPeptide::new(sequence, &buffers.residue_masses, &buffers.shifts);
                self.fragment_builder
                    .fragment_masses(&peptide, &mut buffers.fragments);
                if buffers.fragments.is_empty() {
                    stats.peptides_skipped += 1;
                    continue;
                }

                let mut var_mods = [VarModSlot::default(); NUM_VAR_MOD_SLOTS];
                for (slot, (position, type_id)) in var_mods.iter_mut().zip(pattern.iter()) {
                    *slot = VarModSlot {
                        type_id: *type_id,
                        position: *position,
                    };
                }
                let candidate = Candidate {
                    protein_index,
                    start: digest.start() as u32,
                    length: digest.len() as u8,
                    decoy: protein.is_decoy(),
                    monoisotopic_mass: peptide.monoisotopic_mass() as f32,
                    var_mods,
                };

                let candidate_id = {
                    let mut candidates = lock(&shared.candidates, "candidate list")?;
                    let id = candidates.len() as u32;
                    candidates.push(candidate);
                    id
                };
                for mass in buffers.fragments.iter() {
                    local.insert(*mass, candidate_id);
                }
                stats.candidates += 1;
            }
        }
        Ok(())
    }
}
