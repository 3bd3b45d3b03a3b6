//! On-disk cache of built indices.
//!
//! A build is identified by an [`IndexSignature`], derived only from the
//! inputs that change what gets built. Each signature owns two files in the
//! cache directory:
//!
//! - `<signature>-peptideIndex.ind` holding the candidate list
//! - `<signature>-fragmentIndex.ind` holding the fragment index
//!
//! Both are zstd compressed MessagePack wrapped in a small envelope with a
//! format version and the signature. Anything that goes wrong while reading
//! is a cache miss, never an error.

use crate::errors::{
    CacheError,
    Result,
};
use crate::indexing::{
    BuiltIndex,
    FragmentIndex,
    IndexingParameters,
};
use crate::models::{
    Candidate,
    ModificationCatalog,
};
use crate::utils::serde::{
    load_compressed,
    save_compressed,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt::Display;
use std::path::{
    Path,
    PathBuf,
};
use std::time::Instant;
use tracing::{
    error,
    info,
    warn,
};

const CACHE_FORMAT_VERSION: u32 = 1;

/// Deterministic name of an index build.
///
/// ```
/// use fragseek::cache::IndexSignature;
/// use fragseek::indexing::IndexingParameters;
/// use fragseek::models::ModificationCatalog;
/// use std::path::PathBuf;
///
/// let sig = IndexSignature::new(
///     &[PathBuf::from("/data/human.fasta")],
///     true,
///     &ModificationCatalog::default(),
///     &IndexingParameters::default(),
/// );
/// assert!(sig.as_str().starts_with("human-WithDecoys-"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexSignature(String);

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|x| x.to_string_lossy().to_string())
        .unwrap_or_default()
}

impl IndexSignature {
    pub fn new(
        database_paths: &[PathBuf],
        decoys: bool,
        catalog: &ModificationCatalog,
        params: &IndexingParameters,
    ) -> Self {
        let mut sig = database_paths
            .iter()
            .map(|x| file_stem(x))
            .collect::<Vec<_>>()
            .join("-");
        if decoys {
            sig.push_str("-WithDecoys");
        }
        for (tag, names) in [
            ("fixed", &catalog.fixed_list_names),
            ("variable", &catalog.variable_list_names),
            ("localize", &catalog.localize_list_names),
        ] {
            if !names.is_empty() {
                sig.push('-');
                sig.push_str(tag);
                for name in names {
                    sig.push('-');
                    sig.push_str(name);
                }
            }
        }

        let digestion = &params.digestion;
        let ions = params
            .ion_types
            .iter()
            .map(|x| x.to_string())
            .collect::<String>();
        sig.push_str(&format!(
            "-{}-mc{}-{}-iso{}-len{}to{}-{}-max{}",
            digestion.protease,
            digestion.max_missed_cleavages,
            digestion.initiator_methionine,
            params.max_isoforms,
            digestion.min_peptide_length,
            digestion.max_peptide_length,
            ions,
            params.max_fragment_mass,
        ));

        let sig = sig
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        Self(sig)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for IndexSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope<P> {
    version: u32,
    signature: String,
    payload: P,
}

#[derive(Debug, Clone)]
pub struct IndexCache {
    directory: PathBuf,
}

impl IndexCache {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn candidates_path(&self, signature: &IndexSignature) -> PathBuf {
        self.directory
            .join(format!("{}-peptideIndex.ind", signature.as_str()))
    }

    pub fn fragment_index_path(&self, signature: &IndexSignature) -> PathBuf {
        self.directory
            .join(format!("{}-fragmentIndex.ind", signature.as_str()))
    }

    /// Restores a previous build, `None` on any kind of miss.
    pub fn load(&self, signature: &IndexSignature) -> Option<(Vec<Candidate>, FragmentIndex)> {
        let candidates_path = self.candidates_path(signature);
        let index_path = self.fragment_index_path(signature);
        if !candidates_path.exists() || !index_path.exists() {
            info!("No cached index for {}", signature);
            return None;
        }

        let st = Instant::now();
        match self.try_load(signature, &candidates_path, &index_path) {
            Ok(Some(x)) => {
                info!(
                    "Loaded {} candidates from cache at {:?} in {:?}",
                    x.0.len(),
                    self.directory,
                    st.elapsed()
                );
                Some(x)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to load cached index, rebuilding: {}", e);
                None
            }
        }
    }

    fn try_load(
        &self,
        signature: &IndexSignature,
        candidates_path: &Path,
        index_path: &Path,
    ) -> std::result::Result<Option<(Vec<Candidate>, FragmentIndex)>, CacheError> {
        let candidates: CacheEnvelope<Vec<Candidate>> = load_compressed(candidates_path)?;
        check_envelope(&candidates, signature, candidates_path)?;
        let index: CacheEnvelope<FragmentIndex> = load_compressed(index_path)?;
        check_envelope(&index, signature, index_path)?;

        let candidates = candidates.payload;
        let index = index.payload;
        let ids_fit = index
            .max_candidate_id()
            .is_none_or(|x| (x as usize) < candidates.len());
        if !index.is_consistent() || !ids_fit {
            warn!(
                "Cached index at {:?} is inconsistent, ignoring it",
                index_path
            );
            return Ok(None);
        }
        Ok(Some((candidates, index)))
    }

    pub fn store(
        &self,
        signature: &IndexSignature,
        candidates: &[Candidate],
        index: &FragmentIndex,
    ) -> std::result::Result<(), CacheError> {
        std::fs::create_dir_all(&self.directory).map_err(|source| CacheError::Io {
            source,
            path: self.directory.clone(),
        })?;
        let st = Instant::now();
        save_compressed(
            &CacheEnvelope {
                version: CACHE_FORMAT_VERSION,
                signature: signature.as_str().to_string(),
                payload: candidates,
            },
            &self.candidates_path(signature),
        )?;
        save_compressed(
            &CacheEnvelope {
                version: CACHE_FORMAT_VERSION,
                signature: signature.as_str().to_string(),
                payload: index,
            },
            &self.fragment_index_path(signature),
        )?;
        info!("Saved index to cache in {:?}", st.elapsed());
        Ok(())
    }

    /// Loads the index for `signature`, or builds it with `build` and stores
    /// it. Failing to store is logged and otherwise ignored.
    pub fn load_or_build<F>(
        &self,
        signature: &IndexSignature,
        build: F,
    ) -> Result<(Vec<Candidate>, FragmentIndex)>
    where
        F: FnOnce() -> Result<BuiltIndex>,
    {
        if let Some(x) = self.load(signature) {
            return Ok(x);
        }
        let built = build()?;
        if let Err(e) = self.store(signature, &built.candidates, &built.fragment_index) {
            error!("Failed to save index to cache: {}", e);
        }
        Ok((built.candidates, built.fragment_index))
    }
}

fn check_envelope<P>(
    envelope: &CacheEnvelope<P>,
    signature: &IndexSignature,
    path: &Path,
) -> std::result::Result<(), CacheError> {
    if envelope.version != CACHE_FORMAT_VERSION {
        return Err(CacheError::VersionMismatch {
            expected: CACHE_FORMAT_VERSION,
            found: envelope.version,
            path: path.to_path_buf(),
        });
    }
    if envelope.signature != signature.as_str() {
        return Err(CacheError::SignatureMismatch {
            expected: signature.as_str().to_string(),
            found: envelope.signature.clone(),
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
