mod candidate;
mod decoy;
mod digest;
mod modification;
mod protein;
mod scan;

pub use candidate::{
    Candidate,
    NUM_VAR_MOD_SLOTS,
    VarModSlot,
};
pub use decoy::DecoyMarking;
pub use digest::DigestSlice;
pub use modification::{
    Modification,
    ModificationCatalog,
    ModificationList,
    ModificationPosition,
};
pub use protein::Protein;
pub use scan::Ms2Scan;
