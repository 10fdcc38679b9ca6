// mod.rs - Output writers for inclusivity tables, consensus results and command scripts

use crate::core::degenerate::ConsensusPrimer;
use crate::data::loaders::tsv::{tsv_reader, tsv_writer, RegionRow, REGION_HEADER};
use crate::data::record::TripletKey;
use crate::error::{QpcrError, Result};
use csv::StringRecord;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Ensure parent directory exists before creating file
pub fn ensure_parent_dir(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        create_dir_all(parent).map_err(|e| QpcrError::io(parent, e))?;
    }
    Ok(())
}

/// A region-table row prefixed with the subjects the triplet amplifies
#[derive(Debug, Clone, PartialEq)]
pub struct InclusivityRow {
    /// Comma-joined, sorted subject identifiers
    pub hits: String,
    pub region: RegionRow,
}

impl InclusivityRow {
    fn fields(&self) -> Vec<String> {
        let mut fields = Vec::with_capacity(REGION_HEADER.len() + 1);
        fields.push(self.hits.clone());
        fields.extend(self.region.fields());
        fields
    }
}

fn inclusivity_header() -> Vec<&'static str> {
    std::iter::once("hits").chain(REGION_HEADER).collect()
}

/// Write one per-region inclusivity table; the header is written even with no rows
pub fn write_inclusivity_table(path: &Path, rows: &[InclusivityRow]) -> Result<()> {
    let mut writer = tsv_writer(path)?;
    writer
        .write_record(inclusivity_header())
        .map_err(|e| QpcrError::csv(path, e))?;
    for row in rows {
        writer
            .write_record(row.fields())
            .map_err(|e| QpcrError::csv(path, e))?;
    }
    writer.flush().map_err(|e| QpcrError::io(path, e))?;
    Ok(())
}

pub fn read_inclusivity_table(path: &Path) -> Result<Vec<InclusivityRow>> {
    let mut reader = tsv_reader(path)?;
    let headers = reader.headers().map_err(|e| QpcrError::csv(path, e))?.clone();
    if headers.get(0) != Some("hits") {
        return Err(QpcrError::parse(
            path.display().to_string(),
            "first column must be 'hits'",
        ));
    }
    let region_headers: StringRecord = headers.iter().skip(1).collect();

    let mut rows = Vec::new();
    for (row_num, result) in reader.records().enumerate() {
        let record = result.map_err(|e| QpcrError::csv(path, e))?;
        let hits = record.get(0).unwrap_or_default().to_string();
        let rest: StringRecord = record.iter().skip(1).collect();
        let region: RegionRow = rest.deserialize(Some(&region_headers)).map_err(|e| {
            QpcrError::parse(
                path.display().to_string(),
                format!("row {}: {}", row_num + 1, e),
            )
        })?;
        rows.push(InclusivityRow { hits, region });
    }
    Ok(rows)
}

/// Concatenate the rows of every non-empty table into one file with a single header.
/// Returns the number of rows written.
pub fn merge_inclusivity_tables(tables: &[PathBuf], output: &Path) -> Result<usize> {
    let mut merged = Vec::new();
    let mut skipped = 0;
    for table in tables {
        let rows = read_inclusivity_table(table)?;
        if rows.is_empty() {
            skipped += 1;
            continue;
        }
        merged.extend(rows);
    }
    if skipped > 0 {
        log::debug!("merge: skipped {} empty inclusivity tables", skipped);
    }
    write_inclusivity_table(output, &merged)?;
    Ok(merged.len())
}

/// Consensus outcome of one triplet
#[derive(Debug, Clone, PartialEq)]
pub struct DegenerateResult {
    pub triplet: TripletKey,
    pub forward: ConsensusPrimer,
    pub reverse: ConsensusPrimer,
    pub probe: Option<ConsensusPrimer>,
    /// Included fraction of the reference set
    pub inclusivity: f64,
}

impl DegenerateResult {
    /// fwd_seq, fwd_n, rvs_seq, rvs_n, prb_seq, prb_n, inclusivity
    fn consensus_fields(&self) -> Vec<String> {
        let (probe_seq, probe_n) = match &self.probe {
            Some(p) => (p.sequence.clone(), p.ambiguous_sites.to_string()),
            None => (String::new(), String::new()),
        };
        vec![
            self.forward.sequence.clone(),
            self.forward.ambiguous_sites.to_string(),
            self.reverse.sequence.clone(),
            self.reverse.ambiguous_sites.to_string(),
            probe_seq,
            probe_n,
            self.inclusivity.to_string(),
        ]
    }
}

/// Single-line result file inside a triplet directory
pub fn write_degenerate_result(path: &Path, result: &DegenerateResult) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|e| QpcrError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{}", result.consensus_fields().join("\t"))
        .map_err(|e| QpcrError::io(path, e))?;
    writer.flush().map_err(|e| QpcrError::io(path, e))?;
    Ok(())
}

pub const DEGENERATE_HEADER: [&str; 10] = [
    "forward_sequence",
    "reverse_sequence",
    "probe_sequence",
    "forward_degenerate",
    "forward_degenerate_sites",
    "reverse_degenerate",
    "reverse_degenerate_sites",
    "probe_degenerate",
    "probe_degenerate_sites",
    "inclusivity",
];

/// Summary table over all triplets that passed the inclusivity threshold
pub fn write_degenerate_summary(path: &Path, results: &[DegenerateResult]) -> Result<()> {
    let mut writer = tsv_writer(path)?;
    writer
        .write_record(DEGENERATE_HEADER)
        .map_err(|e| QpcrError::csv(path, e))?;
    for result in results {
        let mut fields = vec![
            result.triplet.forward.clone(),
            result.triplet.reverse.clone(),
            result.triplet.probe.clone().unwrap_or_default(),
        ];
        fields.extend(result.consensus_fields());
        writer
            .write_record(&fields)
            .map_err(|e| QpcrError::csv(path, e))?;
    }
    writer.flush().map_err(|e| QpcrError::io(path, e))?;
    println!("✅ Degenerate summary written to: {}", path.display());
    Ok(())
}

/// Write commands one per line, creating the parent directory
pub fn write_command_list(path: &Path, commands: &[String]) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|e| QpcrError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for command in commands {
        writeln!(writer, "{}", command).map_err(|e| QpcrError::io(path, e))?;
    }
    writer.flush().map_err(|e| QpcrError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loaders::primer3::parse_blocks;
    use crate::data::loaders::tsv::rows_from_records;

    const BLOCK: &str = "SEQUENCE_ID=chr2_sliding_1001-1060
SEQUENCE_TEMPLATE=AAAAACCCCCGGGGGTTTTTAAAAACCCCCGGGGGTTTTTAAAAACCCCCGGGGGTTTTT
PRIMER_LEFT_0=0,10
PRIMER_LEFT_0_SEQUENCE=AAAAACCCCC
PRIMER_LEFT_0_TM=55.0
PRIMER_LEFT_0_GC_PERCENT=50.0
PRIMER_RIGHT_0=49,10
PRIMER_RIGHT_0_SEQUENCE=CCCCCTTTTT
PRIMER_RIGHT_0_TM=56.0
PRIMER_RIGHT_0_GC_PERCENT=50.0
PRIMER_INTERNAL_0=20,10
PRIMER_INTERNAL_0_SEQUENCE=AAAAACCCCC
PRIMER_INTERNAL_0_TM=60.0
PRIMER_INTERNAL_0_GC_PERCENT=50.0
PRIMER_PAIR_0_PRODUCT_SIZE=50
PRIMER_PAIR_0_PRODUCT_TM=80.0
=
";

    fn region() -> RegionRow {
        let records = parse_blocks(BLOCK, "test").unwrap();
        rows_from_records(&records).remove(0)
    }

    #[test]
    fn test_inclusivity_table_keeps_hits_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inclusivity").join("chr2.tsv");
        let rows = vec![InclusivityRow {
            hits: "g1,g2".to_string(),
            region: region(),
        }];
        write_inclusivity_table(&path, &rows).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# Generated: "));
        assert!(text.contains("hits\tindex\tchromosome"));

        let loaded = read_inclusivity_table(&path).unwrap();
        assert_eq!(loaded, rows);
    }

    #[test]
    fn test_merge_skips_empty_tables() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.tsv");
        let b = dir.path().join("b.tsv");
        let c = dir.path().join("c.tsv");
        let row = InclusivityRow {
            hits: "g1".to_string(),
            region: region(),
        };
        write_inclusivity_table(&a, &[row.clone()]).unwrap();
        write_inclusivity_table(&b, &[]).unwrap();
        write_inclusivity_table(&c, &[row.clone(), row]).unwrap();

        let merged = dir.path().join("inclusivity.tsv");
        let count = merge_inclusivity_tables(&[a, b, c], &merged).unwrap();
        assert_eq!(count, 3);
        assert_eq!(read_inclusivity_table(&merged).unwrap().len(), 3);
        let text = std::fs::read_to_string(&merged).unwrap();
        assert_eq!(text.matches("hits\t").count(), 1);
    }

    #[test]
    fn test_degenerate_result_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AC-GT-TT").join("inclusivity_and_degenerate.txt");
        let result = DegenerateResult {
            triplet: TripletKey {
                forward: "AC".to_string(),
                reverse: "GT".to_string(),
                probe: Some("TT".to_string()),
            },
            forward: ConsensusPrimer {
                sequence: "AR".to_string(),
                ambiguous_sites: 1,
            },
            reverse: ConsensusPrimer {
                sequence: "GT".to_string(),
                ambiguous_sites: 0,
            },
            probe: Some(ConsensusPrimer {
                sequence: "TT".to_string(),
                ambiguous_sites: 0,
            }),
            inclusivity: 0.75,
        };
        write_degenerate_result(&path, &result).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "AR\t1\tGT\t0\tTT\t0\t0.75\n"
        );

        let summary = dir.path().join("degenerate.tsv");
        write_degenerate_summary(&summary, &[result]).unwrap();
        let text = std::fs::read_to_string(&summary).unwrap();
        assert!(text.contains("AC\tGT\tTT\tAR\t1\tGT\t0\tTT\t0\t0.75"));
    }
}
