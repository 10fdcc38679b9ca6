// lib.rs - qpcr-eval library root

//! # qpcr-eval - qPCR primer/probe evaluation
//!
//! This library turns primer3 candidate output into structured, genome-anchored
//! primer/probe triplets, assigns every distinct oligo a stable catalog id, checks
//! which reference genomes each triplet amplifies from alignment hits, and derives
//! IUPAC degenerate consensus primers from the amplicons extracted across a reference set.
//!
//! ## Features
//!
//! - **Primer3 parsing**: Boulder-IO blocks to candidate records with absolute coordinates
//! - **Primer catalog**: deterministic `p<N>` ids, FASTA/JSON export and reload
//! - **Inclusivity**: forward -> probe -> reverse chain matching over alignment hits
//! - **Degenerate consensus**: per-column IUPAC coding with a frequency threshold
//! - **Parallel stages**: per-region and per-triplet work on the rayon pool
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use qpcr_eval::prelude::*;
//! use qpcr_eval::core::pipeline::{catalog_stage, inclusivity_stage, parse_stage};
//!
//! let workdir = Workdir::new("qpcr_analysis");
//! parse_stage(&workdir)?;
//! let catalog = catalog_stage(&workdir)?;
//! println!("{} unique oligos", catalog.len());
//!
//! // ... run the aligner on blast/primers.fasta into blast/primers.out ...
//!
//! let matcher = InclusivityMatcher::new(InclusivityConfig::default());
//! let summary = inclusivity_stage(&workdir, &matcher, &RetentionPolicy::default())?;
//! println!("{} triplets retained", summary.retained);
//! # Ok::<(), qpcr_eval::QpcrError>(())
//! ```

// Re-export all main modules
pub mod cli;
pub mod core;
pub mod data;
pub mod error;
pub mod output;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::cli::{validate_amplicon, validate_degenerate, validate_inclusivity};
    pub use crate::cli::{Args, Command};
    pub use crate::core::{BatchExecutor, CommandOutcome, ShellExecutor};
    pub use crate::core::{CatalogId, PrimerCatalog};
    pub use crate::core::{ConsensusBuilder, ConsensusPrimer};
    pub use crate::core::{InclusivityConfig, InclusivityMatcher, RetentionPolicy};
    pub use crate::data::{AlignmentHit, CandidateRecord, HitIndex, RegionRow, TripletKey};
    pub use crate::data::Workdir;
    pub use crate::error::QpcrError;
}

// Re-export main types at the root level for convenience
pub use crate::core::{ConsensusBuilder, InclusivityMatcher, PrimerCatalog};
pub use data::{CandidateRecord, Workdir};
pub use error::QpcrError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn get_info() -> String {
    format!(
        "qpcr-eval v{} - qPCR primer/probe inclusivity and degenerate consensus",
        VERSION
    )
}
