// alignment.rs - Alignment hits of catalog sequences against reference subjects

use crate::core::catalog::CatalogId;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strand {
    Plus,
    Minus,
}

/// Raw 15-column row as emitted by the aligner
/// (`qseqid sseqid length qlen slen sstart send qstart qend qcovs pident nident evalue bitscore sstrand`)
#[derive(Debug, Clone, Deserialize)]
pub struct HitRow {
    pub qseqid: String,
    pub sseqid: String,
    pub length: u64,
    pub qlen: u64,
    pub slen: u64,
    pub sstart: i64,
    pub send: i64,
    pub qstart: u64,
    pub qend: u64,
    pub qcovs: f64,
    pub pident: f64,
    pub nident: u64,
    pub evalue: f64,
    pub bitscore: f64,
    pub sstrand: Strand,
}

/// One hit of a catalog sequence on a subject.
///
/// On the minus strand `alignment_start > alignment_end`: coordinates follow the query
/// 5'->3', so `alignment_end` is the leftmost subject base.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentHit {
    pub query: CatalogId,
    pub subject: String,
    pub strand: Strand,
    pub alignment_start: i64,
    pub alignment_end: i64,
    pub query_length: u64,
    pub query_alignment_end: u64,
    pub percent_identity: f64,
    pub evalue: f64,
}

impl AlignmentHit {
    /// Unaligned bases between the alignment end and the query's 3' terminus
    pub fn three_prime_overhang(&self) -> u64 {
        self.query_length.saturating_sub(self.query_alignment_end)
    }
}

/// Hits grouped by catalog id; built once per run and shared read-only
#[derive(Debug, Default)]
pub struct HitIndex {
    hits: HashMap<CatalogId, Vec<AlignmentHit>>,
    total: usize,
}

impl HitIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, hit: AlignmentHit) {
        self.total += 1;
        self.hits.entry(hit.query).or_default().push(hit);
    }

    /// Hits of one id; an id without hits yields an empty slice
    pub fn hits_for(&self, id: CatalogId) -> &[AlignmentHit] {
        self.hits.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn total_hits(&self) -> usize {
        self.total
    }

    pub fn queries(&self) -> usize {
        self.hits.len()
    }

    /// Distinct subjects seen across all hits
    pub fn subject_count(&self) -> usize {
        let mut subjects = std::collections::HashSet::new();
        for hit in self.hits.values().flatten() {
            subjects.insert(hit.subject.as_str());
        }
        subjects.len()
    }
}

impl FromIterator<AlignmentHit> for HitIndex {
    fn from_iter<I: IntoIterator<Item = AlignmentHit>>(iter: I) -> Self {
        let mut index = HitIndex::new();
        for hit in iter {
            index.insert(hit);
        }
        index
    }
}
