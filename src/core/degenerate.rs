// degenerate.rs - IUPAC degenerate consensus over per-genome primer instances

use crate::error::{QpcrError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// IUPAC code -> sorted base set. Read in both directions.
pub const IUPAC_TABLE: [(u8, &str); 15] = [
    (b'A', "A"),
    (b'C', "C"),
    (b'G', "G"),
    (b'T', "T"),
    (b'R', "AG"),
    (b'Y', "CT"),
    (b'S', "CG"),
    (b'W', "AT"),
    (b'K', "GT"),
    (b'M', "AC"),
    (b'B', "CGT"),
    (b'D', "AGT"),
    (b'H', "ACT"),
    (b'V', "ACG"),
    (b'N', "ACGT"),
];

/// Base set of an IUPAC symbol (case-insensitive)
pub fn expand_symbol(symbol: u8) -> Option<&'static str> {
    let upper = symbol.to_ascii_uppercase();
    IUPAC_TABLE
        .iter()
        .find(|(code, _)| *code == upper)
        .map(|(_, bases)| *bases)
}

/// IUPAC symbol of an exact, sorted base-set string
pub fn code_for(bases: &str) -> Option<u8> {
    IUPAC_TABLE
        .iter()
        .find(|(_, set)| *set == bases)
        .map(|(code, _)| *code)
}

pub fn is_plain_base(code: u8) -> bool {
    matches!(code, b'A' | b'C' | b'G' | b'T')
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusPrimer {
    pub sequence: String,
    pub ambiguous_sites: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsensusBuilder {
    /// A symbol is kept when its column frequency is strictly above this fraction
    pub min_fraction: f64,
}

impl Default for ConsensusBuilder {
    fn default() -> Self {
        Self { min_fraction: 0.2 }
    }
}

impl ConsensusBuilder {
    pub fn new(min_fraction: f64) -> Self {
        Self { min_fraction }
    }

    /// Build the consensus of equal-length instances.
    ///
    /// An ambiguous input base is tallied as one symbol standing for its whole base set
    /// (`R` counts once as "AG"), not as fractional observations of each base.
    pub fn build<S: AsRef<[u8]>>(&self, instances: &[S]) -> Result<ConsensusPrimer> {
        let first = instances.first().ok_or(QpcrError::NoInstances)?;
        let width = first.as_ref().len();
        for (index, instance) in instances.iter().enumerate() {
            let found = instance.as_ref().len();
            if found != width {
                return Err(QpcrError::LengthMismatch {
                    index,
                    expected: width,
                    found,
                });
            }
        }

        let total = instances.len() as f64;
        let mut sequence = String::with_capacity(width);
        let mut ambiguous_sites = 0;

        for column in 0..width {
            let mut tally: BTreeMap<&'static str, usize> = BTreeMap::new();
            for instance in instances {
                let symbol = instance.as_ref()[column];
                let bases = expand_symbol(symbol).ok_or_else(|| QpcrError::AmbiguityLookupFailure {
                    combination: (symbol as char).to_string(),
                    column,
                })?;
                *tally.entry(bases).or_insert(0) += 1;
            }

            let mut selected: Vec<&str> = tally
                .iter()
                .filter(|(_, count)| **count as f64 / total > self.min_fraction)
                .map(|(bases, _)| *bases)
                .collect();
            selected.sort_unstable();
            let combination = selected.concat();

            let code = code_for(&combination)
                .ok_or(QpcrError::AmbiguityLookupFailure { combination, column })?;
            if !is_plain_base(code) {
                ambiguous_sites += 1;
            }
            sequence.push(code as char);
        }

        Ok(ConsensusPrimer {
            sequence,
            ambiguous_sites,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_base_column_becomes_r() {
        let builder = ConsensusBuilder::default();
        let result = builder.build(&["A", "A", "A", "G", "G"]).unwrap();
        assert_eq!(result.sequence, "R");
        assert_eq!(result.ambiguous_sites, 1);
    }

    #[test]
    fn test_uniform_column_is_plain() {
        let builder = ConsensusBuilder::default();
        let result = builder.build(&["ACGT"; 5]).unwrap();
        assert_eq!(result.sequence, "ACGT");
        assert_eq!(result.ambiguous_sites, 0);
    }

    #[test]
    fn test_rare_variant_below_threshold_ignored() {
        // T at 1/5 = 0.2 is not strictly above 0.2
        let builder = ConsensusBuilder::default();
        let result = builder
            .build(&["ACG", "ACG", "ACG", "ACG", "ATG"])
            .unwrap();
        assert_eq!(result.sequence, "ACG");
        assert_eq!(result.ambiguous_sites, 0);
    }

    #[test]
    fn test_multiple_columns() {
        let builder = ConsensusBuilder::default();
        let result = builder.build(&["ACGA", "ATGA", "ACGC", "ATGC"]).unwrap();
        assert_eq!(result.sequence, "AYGM");
        assert_eq!(result.ambiguous_sites, 2);
    }

    #[test]
    fn test_ambiguous_input_tallied_as_set() {
        // N expands to ACGT and is counted as a single symbol
        let builder = ConsensusBuilder::default();
        let result = builder.build(&["N", "N", "N", "N", "A"]).unwrap();
        assert_eq!(result.sequence, "N");
        assert_eq!(result.ambiguous_sites, 1);
    }

    #[test]
    fn test_mixed_set_without_code_fails() {
        // "A" and "AG" both selected -> "AAG" has no IUPAC code
        let builder = ConsensusBuilder::default();
        match builder.build(&["A", "A", "R", "R"]) {
            Err(QpcrError::AmbiguityLookupFailure { combination, column }) => {
                assert_eq!(combination, "AAG");
                assert_eq!(column, 0);
            }
            other => panic!("expected lookup failure, got {:?}", other),
        }
    }

    #[test]
    fn test_nothing_selected_fails() {
        let builder = ConsensusBuilder::default();
        assert!(matches!(
            builder.build(&["A", "C", "G", "T", "R"]),
            Err(QpcrError::AmbiguityLookupFailure { .. })
        ));
    }

    #[test]
    fn test_unknown_symbol_fails() {
        let builder = ConsensusBuilder::default();
        assert!(matches!(
            builder.build(&["A-", "AC"]),
            Err(QpcrError::AmbiguityLookupFailure { .. })
        ));
    }

    #[test]
    fn test_length_mismatch() {
        let builder = ConsensusBuilder::default();
        match builder.build(&["ACGT", "ACG"]) {
            Err(QpcrError::LengthMismatch {
                index,
                expected,
                found,
            }) => {
                assert_eq!((index, expected, found), (1, 4, 3));
            }
            other => panic!("expected length mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_no_instances() {
        let builder = ConsensusBuilder::default();
        let empty: [&str; 0] = [];
        assert!(matches!(builder.build(&empty), Err(QpcrError::NoInstances)));
    }

    #[test]
    fn test_lowercase_input_accepted() {
        let builder = ConsensusBuilder::default();
        let result = builder.build(&["acgt", "acgt"]).unwrap();
        assert_eq!(result.sequence, "ACGT");
    }

    #[test]
    fn test_table_round_trip() {
        for (code, bases) in IUPAC_TABLE {
            assert_eq!(code_for(bases), Some(code));
            assert_eq!(expand_symbol(code), Some(bases));
        }
    }
}
