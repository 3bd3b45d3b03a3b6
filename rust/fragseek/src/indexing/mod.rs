pub mod candidate_builder;
pub mod fragment_index;
pub mod modified_peptide;

pub use candidate_builder::{
    BuiltIndex,
    CandidateBuilder,
    DEFAULT_MAX_ISOFORMS,
    IndexBuildStats,
    IndexingParameters,
};
pub use fragment_index::{
    FragmentIndex,
    FragmentIndexBuilder,
    quantize_mass,
};
pub use modified_peptide::{
    MAX_MODS_PER_PEPTIDE,
    ModPattern,
    ModificationSites,
    ModifiedPeptide,
};
