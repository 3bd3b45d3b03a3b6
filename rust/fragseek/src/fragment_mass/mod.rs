pub mod fragment_mass_builder;

pub use fragment_mass_builder::{
    DEFAULT_MAX_FRAGMENT_MASS,
    FragmentMassBuilder,
    IonType,
};
