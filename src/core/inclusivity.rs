// inclusivity.rs - Which reference subjects a forward/reverse/probe triplet amplifies

use crate::core::catalog::{CatalogId, PrimerCatalog};
use crate::data::alignment::{AlignmentHit, HitIndex, Strand};
use crate::data::loaders::tsv::RegionRow;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Matching thresholds for the forward -> probe -> reverse chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InclusivityConfig {
    /// Exclusive lower bound on `reverse.alignment_end - forward.alignment_start`
    pub min_product_len: i64,
    /// Exclusive upper bound on the same span
    pub max_product_len: i64,
    /// Hits leaving more unaligned 3' bases than this are discarded
    pub max_three_prime_mismatch: u64,
}

impl Default for InclusivityConfig {
    fn default() -> Self {
        Self {
            min_product_len: 70,
            max_product_len: 1000,
            max_three_prime_mismatch: 2,
        }
    }
}

impl InclusivityConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.min_product_len < 0 {
            return Err(format!(
                "min_product_len must be non-negative (got {})",
                self.min_product_len
            ));
        }
        if self.max_product_len <= self.min_product_len.saturating_add(1) {
            return Err(format!(
                "product length window ({}, {}) is empty",
                self.min_product_len, self.max_product_len
            ));
        }
        Ok(())
    }
}

/// Catalog ids of one triplet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimerTriplet {
    pub forward: CatalogId,
    pub reverse: CatalogId,
    pub probe: Option<CatalogId>,
}

impl PrimerTriplet {
    /// Resolve a region row's sequences; an unregistered sequence is a catalog miss
    pub fn from_row(row: &RegionRow, catalog: &PrimerCatalog) -> Result<Self> {
        Ok(Self {
            forward: catalog.id_of(&row.forward_sequence)?,
            reverse: catalog.id_of(&row.reverse_sequence)?,
            probe: row
                .probe_sequence
                .as_deref()
                .map(|p| catalog.id_of(p))
                .transpose()?,
        })
    }
}

/// Primer-pair footprint on one subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmpliconRegion<'a> {
    pub subject: &'a str,
    pub forward_right_edge: i64,
    pub reverse_left_edge: i64,
}

/// Subjects a triplet amplifies, sorted and deduplicated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InclusivityResult {
    pub subjects: BTreeSet<String>,
}

impl InclusivityResult {
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    /// Comma-joined subject list for the `hits` column
    pub fn joined(&self) -> String {
        self.subjects.iter().cloned().collect::<Vec<_>>().join(",")
    }

    pub fn fraction_of(&self, total_subjects: usize) -> f64 {
        if total_subjects == 0 {
            return 0.0;
        }
        self.subjects.len() as f64 / total_subjects as f64
    }
}

/// Decides whether a matched triplet is written out
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionPolicy {
    /// Minimum included fraction of `total_subjects`
    pub min_fraction: f64,
    /// Reference subject count; `None` disables the fraction check
    pub total_subjects: Option<usize>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            min_fraction: 0.0,
            total_subjects: None,
        }
    }
}

impl RetentionPolicy {
    pub fn retains(&self, result: &InclusivityResult) -> bool {
        if result.is_empty() {
            return false;
        }
        match self.total_subjects {
            Some(total) => result.fraction_of(total) >= self.min_fraction,
            None => true,
        }
    }
}

pub struct InclusivityMatcher {
    config: InclusivityConfig,
}

impl InclusivityMatcher {
    pub fn new(config: InclusivityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InclusivityConfig {
        &self.config
    }

    /// Hits on `strand` whose 3' end extends to within tolerance of the query terminus
    fn usable<'h>(
        &self,
        hits: &'h [AlignmentHit],
        strand: Strand,
    ) -> impl Iterator<Item = &'h AlignmentHit> {
        let tolerance = self.config.max_three_prime_mismatch;
        hits.iter()
            .filter(move |hit| hit.three_prime_overhang() <= tolerance && hit.strand == strand)
    }

    /// Forward(plus) x reverse(minus) pairs on the same subject within the product window
    pub fn amplicon_regions<'h>(
        &self,
        forward_hits: &'h [AlignmentHit],
        reverse_hits: &'h [AlignmentHit],
    ) -> Vec<AmpliconRegion<'h>> {
        let reverse: Vec<&AlignmentHit> = self.usable(reverse_hits, Strand::Minus).collect();
        let mut regions = Vec::new();

        for fh in self.usable(forward_hits, Strand::Plus) {
            for rh in reverse.iter().filter(|rh| rh.subject == fh.subject) {
                let span = rh.alignment_end - fh.alignment_start;
                if self.config.min_product_len < span && span < self.config.max_product_len {
                    regions.push(AmpliconRegion {
                        subject: fh.subject.as_str(),
                        forward_right_edge: fh.alignment_end,
                        reverse_left_edge: rh.alignment_end,
                    });
                }
            }
        }
        regions
    }

    /// Evaluate one triplet against its hits. A triplet without a probe is satisfied by
    /// the primer pair alone.
    pub fn evaluate(&self, triplet: &PrimerTriplet, index: &HitIndex) -> InclusivityResult {
        let regions = self.amplicon_regions(
            index.hits_for(triplet.forward),
            index.hits_for(triplet.reverse),
        );

        let mut result = InclusivityResult::default();
        let Some(probe_id) = triplet.probe else {
            result
                .subjects
                .extend(regions.iter().map(|r| r.subject.to_string()));
            return result;
        };

        let probes: Vec<&AlignmentHit> = self
            .usable(index.hits_for(probe_id), Strand::Plus)
            .collect();
        for region in &regions {
            if result.subjects.contains(region.subject) {
                continue;
            }
            let inside = probes.iter().any(|ph| {
                ph.subject == region.subject
                    && ph.alignment_start > region.forward_right_edge
                    && ph.alignment_end < region.reverse_left_edge
            });
            if inside {
                result.subjects.insert(region.subject.to_string());
            }
        }

        log::debug!(
            "triplet {}/{}/{}: {} regions, {} subjects",
            triplet.forward,
            triplet.reverse,
            probe_id,
            regions.len(),
            result.len()
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(query: u32, subject: &str, strand: Strand, start: i64, end: i64) -> AlignmentHit {
        AlignmentHit {
            query: CatalogId(query),
            subject: subject.to_string(),
            strand,
            alignment_start: start,
            alignment_end: end,
            query_length: 20,
            query_alignment_end: 20,
            percent_identity: 100.0,
            evalue: 1e-3,
        }
    }

    fn triplet() -> PrimerTriplet {
        PrimerTriplet {
            forward: CatalogId(0),
            reverse: CatalogId(1),
            probe: Some(CatalogId(2)),
        }
    }

    fn matcher() -> InclusivityMatcher {
        InclusivityMatcher::new(InclusivityConfig::default())
    }

    #[test]
    fn test_full_chain_includes_subject() {
        let index: HitIndex = vec![
            hit(0, "g1", Strand::Plus, 100, 120),
            hit(1, "g1", Strand::Minus, 370, 350),
            hit(2, "g1", Strand::Plus, 150, 170),
        ]
        .into_iter()
        .collect();

        let regions = matcher().amplicon_regions(
            index.hits_for(CatalogId(0)),
            index.hits_for(CatalogId(1)),
        );
        assert_eq!(
            regions,
            vec![AmpliconRegion {
                subject: "g1",
                forward_right_edge: 120,
                reverse_left_edge: 350
            }]
        );

        let result = matcher().evaluate(&triplet(), &index);
        assert_eq!(result.joined(), "g1");
    }

    #[test]
    fn test_probe_outside_footprint_rejected() {
        let index: HitIndex = vec![
            hit(0, "g1", Strand::Plus, 100, 120),
            hit(1, "g1", Strand::Minus, 370, 350),
            hit(2, "g1", Strand::Plus, 340, 360),
            hit(2, "g1", Strand::Plus, 110, 130),
        ]
        .into_iter()
        .collect();
        assert!(matcher().evaluate(&triplet(), &index).is_empty());
    }

    #[test]
    fn test_probe_on_minus_strand_rejected() {
        let index: HitIndex = vec![
            hit(0, "g1", Strand::Plus, 100, 120),
            hit(1, "g1", Strand::Minus, 370, 350),
            hit(2, "g1", Strand::Minus, 170, 150),
        ]
        .into_iter()
        .collect();
        assert!(matcher().evaluate(&triplet(), &index).is_empty());
    }

    #[test]
    fn test_three_prime_mismatch_filtered_before_pairing() {
        let mut forward = hit(0, "g1", Strand::Plus, 100, 120);
        forward.query_length = 25;
        forward.query_alignment_end = 21;
        let index: HitIndex = vec![
            forward,
            hit(1, "g1", Strand::Minus, 370, 350),
            hit(2, "g1", Strand::Plus, 150, 170),
        ]
        .into_iter()
        .collect();
        assert!(matcher()
            .amplicon_regions(index.hits_for(CatalogId(0)), index.hits_for(CatalogId(1)))
            .is_empty());
        assert!(matcher().evaluate(&triplet(), &index).is_empty());
    }

    #[test]
    fn test_overhang_of_two_is_tolerated() {
        let mut forward = hit(0, "g1", Strand::Plus, 100, 120);
        forward.query_length = 22;
        forward.query_alignment_end = 20;
        let index: HitIndex = vec![
            forward,
            hit(1, "g1", Strand::Minus, 370, 350),
            hit(2, "g1", Strand::Plus, 150, 170),
        ]
        .into_iter()
        .collect();
        assert_eq!(matcher().evaluate(&triplet(), &index).len(), 1);
    }

    #[test]
    fn test_span_bounds_are_exclusive() {
        // span = 170 - 100 = 70 -> rejected; 1100 - 100 = 1000 -> rejected
        let index: HitIndex = vec![
            hit(0, "g1", Strand::Plus, 100, 120),
            hit(1, "g1", Strand::Minus, 190, 170),
            hit(1, "g1", Strand::Minus, 1120, 1100),
        ]
        .into_iter()
        .collect();
        assert!(matcher()
            .amplicon_regions(index.hits_for(CatalogId(0)), index.hits_for(CatalogId(1)))
            .is_empty());

        let index: HitIndex = vec![
            hit(0, "g1", Strand::Plus, 100, 120),
            hit(1, "g1", Strand::Minus, 191, 171),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            matcher()
                .amplicon_regions(index.hits_for(CatalogId(0)), index.hits_for(CatalogId(1)))
                .len(),
            1
        );
    }

    #[test]
    fn test_pairs_must_share_subject() {
        let index: HitIndex = vec![
            hit(0, "g1", Strand::Plus, 100, 120),
            hit(1, "g2", Strand::Minus, 370, 350),
            hit(2, "g1", Strand::Plus, 150, 170),
            hit(2, "g2", Strand::Plus, 150, 170),
        ]
        .into_iter()
        .collect();
        assert!(matcher().evaluate(&triplet(), &index).is_empty());
    }

    #[test]
    fn test_subject_counted_once_and_missing_hits_ok() {
        let index: HitIndex = vec![
            hit(0, "g1", Strand::Plus, 100, 120),
            hit(0, "g1", Strand::Plus, 102, 122),
            hit(1, "g1", Strand::Minus, 370, 350),
            hit(2, "g1", Strand::Plus, 150, 170),
            hit(0, "g2", Strand::Plus, 10, 30),
            hit(1, "g2", Strand::Minus, 300, 280),
            hit(2, "g2", Strand::Plus, 100, 120),
        ]
        .into_iter()
        .collect();
        let result = matcher().evaluate(&triplet(), &index);
        assert_eq!(result.joined(), "g1,g2");

        let unseen = PrimerTriplet {
            forward: CatalogId(7),
            reverse: CatalogId(8),
            probe: Some(CatalogId(9)),
        };
        assert!(matcher().evaluate(&unseen, &index).is_empty());
    }

    #[test]
    fn test_pair_only_triplet() {
        let index: HitIndex = vec![
            hit(0, "g1", Strand::Plus, 100, 120),
            hit(1, "g1", Strand::Minus, 370, 350),
        ]
        .into_iter()
        .collect();
        let pair = PrimerTriplet {
            forward: CatalogId(0),
            reverse: CatalogId(1),
            probe: None,
        };
        assert_eq!(matcher().evaluate(&pair, &index).len(), 1);
    }

    #[test]
    fn test_configurable_window() {
        let index: HitIndex = vec![
            hit(0, "g1", Strand::Plus, 100, 120),
            hit(1, "g1", Strand::Minus, 370, 350),
            hit(2, "g1", Strand::Plus, 150, 170),
        ]
        .into_iter()
        .collect();
        let narrow = InclusivityMatcher::new(InclusivityConfig {
            min_product_len: 70,
            max_product_len: 200,
            max_three_prime_mismatch: 2,
        });
        assert!(narrow.evaluate(&triplet(), &index).is_empty());
    }

    #[test]
    fn test_retention_policy() {
        let mut result = InclusivityResult::default();
        let policy = RetentionPolicy {
            min_fraction: 0.5,
            total_subjects: Some(4),
        };
        assert!(!policy.retains(&result));
        result.subjects.insert("g1".to_string());
        assert!(!policy.retains(&result));
        result.subjects.insert("g2".to_string());
        assert!(policy.retains(&result));
        assert!(RetentionPolicy::default().retains(&result));
    }

    #[test]
    fn test_config_validation() {
        assert!(InclusivityConfig::default().validate().is_ok());
        let bad = InclusivityConfig {
            min_product_len: 100,
            max_product_len: 100,
            max_three_prime_mismatch: 2,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_validate_extreme_window_bounds() {
        let huge_min = InclusivityConfig {
            min_product_len: i64::MAX,
            max_product_len: i64::MAX,
            max_three_prime_mismatch: 2,
        };
        assert!(huge_min.validate().is_err());

        let wide = InclusivityConfig {
            min_product_len: 0,
            max_product_len: i64::MAX,
            max_three_prime_mismatch: 2,
        };
        assert!(wide.validate().is_ok());
    }
}
