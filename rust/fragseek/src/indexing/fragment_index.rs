//! Inverted index from quantized fragment mass to candidate ids.
//!
//! Masses are quantized to integer milli-dalton bins (`round(mass * 1000)`).
//! Two fragment masses that round to the same bin always share a key, even
//! when the exact masses differ. That is the precision/recall trade-off of the
//! index and is relied upon, not a bug.
//!
//! Building happens in two phases:
//! 1. Every worker fills its own [`FragmentIndexBuilder`] and merges it into a
//!    shared one when it is done with its share of proteins.
//! 2. [`FragmentIndexBuilder::build`] freezes the result into a
//!    [`FragmentIndex`], a compressed sparse row layout with sorted keys that
//!    is only ever read from.

use nohash_hasher::BuildNoHashHasher;
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::HashMap;

const BINS_PER_DALTON: f64 = 1000.0;

/// Quantizes a mass to its index bin.
///
/// ```
/// use fragseek::indexing::quantize_mass;
///
/// assert_eq!(quantize_mass(100.0004), quantize_mass(99.9996));
/// assert_ne!(quantize_mass(100.0004), quantize_mass(100.0006));
/// ```
pub fn quantize_mass(mass: f64) -> u32 {
    (mass * BINS_PER_DALTON).round() as u32
}

fn bin_to_mass(bin: u32) -> f64 {
    bin as f64 / BINS_PER_DALTON
}

#[derive(Debug, Default, Clone)]
pub struct FragmentIndexBuilder {
    bins: HashMap<u32, Vec<u32>, BuildNoHashHasher<u32>>,
}

impl FragmentIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `candidate_id` under the bin of `mass`.
    ///
    /// All fragments of a candidate are expected to be inserted back to back,
    /// so a repeated id can only ever be the last one in the bin.
    pub fn insert(&mut self, mass: f64, candidate_id: u32) {
        let ids = self.bins.entry(quantize_mass(mass)).or_default();
        if ids.last() != Some(&candidate_id) {
            ids.push(candidate_id);
        }
    }

    /// Folds `other` into `self`. Candidate ids of the two builders are
    /// expected to be disjoint.
    pub fn merge(&mut self, other: FragmentIndexBuilder) {
        if self.bins.is_empty() {
            self.bins = other.bins;
            return;
        }
        for (bin, ids) in other.bins {
            match self.bins.get_mut(&bin) {
                Some(existing) => existing.extend(ids),
                None => {
                    self.bins.insert(bin, ids);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    #[cfg_attr(
        feature = "instrumentation",
        tracing::instrument(skip_all, level = "trace")
    )]
    pub fn build(self) -> FragmentIndex {
        let mut bins: Vec<(u32, Vec<u32>)> = self.bins.into_iter().collect();
        bins.sort_unstable_by_key(|x| x.0);

        let num_entries = bins.iter().map(|x| x.1.len()).sum();
        let mut keys = Vec::with_capacity(bins.len());
        let mut offsets = Vec::with_capacity(bins.len() + 1);
        let mut candidate_ids = Vec::with_capacity(num_entries);
        offsets.push(0);
        for (bin, ids) in bins {
            keys.push(bin_to_mass(bin));
            candidate_ids.extend(ids);
            offsets.push(candidate_ids.len() as u64);
        }
        FragmentIndex {
            keys,
            offsets,
            candidate_ids,
        }
    }
}

/// Read-only fragment index.
///
/// `keys` are sorted ascending and unique. The candidate ids for
/// `keys[i]` are `candidate_ids[offsets[i]..offsets[i + 1]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentIndex {
    keys: Vec<f64>,
    offsets: Vec<u64>,
    candidate_ids: Vec<u32>,
}

impl Default for FragmentIndex {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            offsets: vec![0],
            candidate_ids: Vec::new(),
        }
    }
}

impl FragmentIndex {
    /// Sorted unique fragment masses, ready for binary search.
    pub fn keys_sorted(&self) -> &[f64] {
        &self.keys
    }

    /// Candidates that produce the fragment at `keys_sorted()[position]`.
    pub fn candidates_at(&self, position: usize) -> &[u32] {
        let start = self.offsets[position] as usize;
        let end = self.offsets[position + 1] as usize;
        &self.candidate_ids[start..end]
    }

    /// Candidates whose fragments quantize to the same bin as `mass`.
    pub fn get(&self, mass: f64) -> Option<&[u32]> {
        let target = bin_to_mass(quantize_mass(mass));
        self.keys
            .binary_search_by(|x| x.total_cmp(&target))
            .ok()
            .map(|pos| self.candidates_at(pos))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Total number of (key, candidate) entries.
    pub fn num_entries(&self) -> usize {
        self.candidate_ids.len()
    }

    pub fn max_candidate_id(&self) -> Option<u32> {
        self.candidate_ids.iter().max().copied()
    }

    /// Checks the structural invariants, used after reading from disk.
    pub fn is_consistent(&self) -> bool {
        self.offsets.len() == self.keys.len() + 1
            && self.offsets.first() == Some(&0)
            && self.offsets.last() == Some(&(self.candidate_ids.len() as u64))
            && self.offsets.windows(2).all(|w| w[0] <= w[1])
            && self.keys.windows(2).all(|w| w[0] < w[1])
    }
}
