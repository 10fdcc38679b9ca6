// sequences.rs - FASTA helpers for region templates and extracted amplicons

use crate::error::{QpcrError, Result};
use bio::io::fasta;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A named sequence read from FASTA
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceInfo {
    pub id: String,
    pub sequence: Vec<u8>,
}

fn open_reader(path: &Path) -> Result<fasta::Reader<BufReader<File>>> {
    let file = File::open(path).map_err(|e| QpcrError::io(path, e))?;
    Ok(fasta::Reader::new(file))
}

/// Read every record of a FASTA file
pub fn read_fasta(path: &Path) -> Result<Vec<SequenceInfo>> {
    let mut sequences = Vec::new();
    for record_result in open_reader(path)?.records() {
        let record = record_result.map_err(|e| {
            QpcrError::parse(
                path.display().to_string(),
                format!("invalid FASTA record: {}", e),
            )
        })?;
        sequences.push(SequenceInfo {
            id: record.id().to_string(),
            sequence: record.seq().to_ascii_uppercase(),
        });
    }
    Ok(sequences)
}

/// Non-empty sequences of a FASTA file. Extractors emit empty records for failed
/// matches; those are dropped.
pub fn read_nonempty_sequences(path: &Path) -> Result<Vec<Vec<u8>>> {
    Ok(read_fasta(path)?
        .into_iter()
        .filter(|info| !info.sequence.is_empty())
        .map(|info| info.sequence)
        .collect())
}

/// Number of records in a FASTA file; a missing file counts as zero
pub fn count_fasta_records(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Ok(0);
    }
    let mut count = 0;
    for record_result in open_reader(path)?.records() {
        record_result.map_err(|e| {
            QpcrError::parse(
                path.display().to_string(),
                format!("invalid FASTA record: {}", e),
            )
        })?;
        count += 1;
    }
    Ok(count)
}

/// Reverse complement (IUPAC-aware)
pub fn reverse_complement(sequence: &[u8]) -> Vec<u8> {
    bio::alphabets::dna::revcomp(sequence)
}
