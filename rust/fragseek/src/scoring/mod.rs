mod accumulator;
pub mod pipeline;
pub mod scorer;
pub mod search_mode;
pub mod search_results;
pub mod selector;
pub mod timings;

pub use pipeline::{
    SearchEngine,
    SearchParameters,
};
pub use scorer::{
    DEFAULT_MAX_PEAKS,
    MassTolerance,
    ScoringBuffer,
    SpectrumScorer,
};
pub use search_mode::{
    AcceptanceKind,
    MassDiffAcceptor,
    SearchMode,
    validate_search_modes,
};
pub use search_results::{
    MatchResult,
    SearchResults,
};
pub use selector::{
    ANCHOR_MASS_DIFFERENCE,
    ANCHOR_TOLERANCE,
    ModeSelector,
    first_is_preferable,
};
pub use timings::SearchTimings;
