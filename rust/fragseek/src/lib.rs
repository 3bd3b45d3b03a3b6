pub mod cache;
pub mod chemistry;
pub mod digestion;
pub mod errors;
pub mod fragment_mass;
pub mod indexing;
pub mod models;
pub mod scoring;
pub mod utils;

pub use cache::{
    IndexCache,
    IndexSignature,
};
pub use digestion::{
    DigestionParameters,
    InitiatorMethionineBehavior,
    Protease,
};
pub use errors::{
    FragSeekError,
    Result,
};
pub use indexing::{
    BuiltIndex,
    CandidateBuilder,
    FragmentIndex,
    IndexingParameters,
};
pub use models::{
    Candidate,
    Modification,
    ModificationCatalog,
    ModificationList,
    Ms2Scan,
    Protein,
};
pub use scoring::{
    MatchResult,
    SearchEngine,
    SearchMode,
    SearchParameters,
    SearchResults,
};
