mod error;
mod rate_law;
mod reaction;
mod network;

pub use error::*;
pub use rate_law::*;
pub use reaction::*;
pub use network::*;

/// Species and parameters are addressed by their position in the
/// network's symbol tables. Species indices follow first-appearance
/// order across the clause list, parameter indices follow declaration
/// order on the builder, and both are fixed once `build()` returns.
pub type SpeciesId = usize;
pub type ParameterId = usize;
