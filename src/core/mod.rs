// mod.rs - Core logic module

pub mod batch;
pub mod catalog;
pub mod coordinates;
pub mod degenerate;
pub mod inclusivity;
pub mod pipeline;

// Re-export main types for convenience
pub use batch::{process_units, BatchExecutor, BatchReport, CommandOutcome, ShellExecutor};
pub use catalog::{CatalogBuilder, CatalogId, PrimerCatalog};
pub use coordinates::{map_record, AbsoluteCoordinates, GenomeSpan};
pub use degenerate::{ConsensusBuilder, ConsensusPrimer};
pub use inclusivity::{
    InclusivityConfig, InclusivityMatcher, InclusivityResult, PrimerTriplet, RetentionPolicy,
};
pub use pipeline::{AmpliconTools, DegenerateSettings};
