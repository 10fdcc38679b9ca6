// record.rs - Candidate primer/probe records parsed from primer3 output

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One oligo (forward primer, reverse primer or probe) in template-local coordinates.
///
/// `local_start` is the 0-based offset emitted by primer3. For the reverse primer it
/// is the rightmost (3') base, not the leftmost.
#[derive(Debug, Clone, PartialEq)]
pub struct Oligo {
    pub local_start: usize,
    pub local_len: usize,
    pub tm: f64,
    pub gc: f64,
    pub sequence: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmpliconInfo {
    pub tm: f64,
    pub product_size: usize,
}

/// One ranked primer3 candidate for a region
#[derive(Debug, Clone)]
pub struct CandidateRecord {
    /// Raw SEQUENCE_ID of the block, used as error context
    pub region_id: String,
    pub chromosome: String,
    /// 0-based genomic start of the window the template was sliced from
    pub window_offset: u64,
    /// primer3 rank index (the `i` in PRIMER_LEFT_i)
    pub index: usize,
    /// Template shared by every candidate of the same block
    pub template: Arc<str>,
    pub forward: Oligo,
    pub reverse: Oligo,
    pub probe: Option<Oligo>,
    pub amplicon: AmpliconInfo,
}

/// Forward/reverse/probe sequence triplet, the unit of inclusivity and consensus work
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TripletKey {
    pub forward: String,
    pub reverse: String,
    pub probe: Option<String>,
}

impl TripletKey {
    /// Directory-safe name `<fwd>-<rvs>-<prb>`
    pub fn dir_name(&self) -> String {
        format!(
            "{}-{}-{}",
            self.forward,
            self.reverse,
            self.probe.as_deref().unwrap_or("NA")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triplet_dir_name() {
        let key = TripletKey {
            forward: "AC".to_string(),
            reverse: "GT".to_string(),
            probe: Some("TT".to_string()),
        };
        assert_eq!(key.dir_name(), "AC-GT-TT");
    }
}
