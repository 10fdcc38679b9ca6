// mod.rs - Data structures module

pub mod alignment;
pub mod loaders;
pub mod record;
pub mod sequences;
pub mod workdir;

// Re-export main types for convenience
pub use alignment::{AlignmentHit, HitIndex, HitRow, Strand};
pub use loaders::RegionRow;
pub use record::{AmpliconInfo, CandidateRecord, Oligo, TripletKey};
pub use sequences::SequenceInfo;
pub use workdir::Workdir;
