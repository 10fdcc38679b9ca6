// tsv.rs - Per-region primer tables (parse stage output, catalog/inclusivity input)

use crate::core::coordinates::{map_record, AbsoluteCoordinates};
use crate::data::record::{CandidateRecord, TripletKey};
use crate::error::{QpcrError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const REGION_HEADER: [&str; 24] = [
    "index",
    "chromosome",
    "forward_start",
    "forward_end",
    "forward_length",
    "forward_tm",
    "forward_gc",
    "forward_sequence",
    "reverse_start",
    "reverse_end",
    "reverse_length",
    "reverse_tm",
    "reverse_gc",
    "reverse_sequence",
    "probe_start",
    "probe_end",
    "probe_length",
    "probe_tm",
    "probe_gc",
    "probe_sequence",
    "amplicon_tm",
    "amplicon_gc",
    "amplicon_length",
    "amplicon_sequence",
];

/// One row of a region table: a candidate with absolute coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRow {
    pub index: usize,
    pub chromosome: String,
    pub forward_start: i64,
    pub forward_end: i64,
    pub forward_length: usize,
    pub forward_tm: f64,
    pub forward_gc: f64,
    pub forward_sequence: String,
    pub reverse_start: i64,
    pub reverse_end: i64,
    pub reverse_length: usize,
    pub reverse_tm: f64,
    pub reverse_gc: f64,
    pub reverse_sequence: String,
    pub probe_start: Option<i64>,
    pub probe_end: Option<i64>,
    pub probe_length: Option<usize>,
    pub probe_tm: Option<f64>,
    pub probe_gc: Option<f64>,
    pub probe_sequence: Option<String>,
    pub amplicon_tm: f64,
    pub amplicon_gc: f64,
    pub amplicon_length: usize,
    pub amplicon_sequence: String,
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

impl RegionRow {
    pub fn from_record(record: &CandidateRecord, coords: &AbsoluteCoordinates) -> Self {
        let probe = record.probe.as_ref();
        Self {
            index: record.index,
            chromosome: record.chromosome.clone(),
            forward_start: coords.forward.start,
            forward_end: coords.forward.end,
            forward_length: record.forward.local_len,
            forward_tm: record.forward.tm,
            forward_gc: record.forward.gc,
            forward_sequence: record.forward.sequence.clone(),
            reverse_start: coords.reverse.start,
            reverse_end: coords.reverse.end,
            reverse_length: record.reverse.local_len,
            reverse_tm: record.reverse.tm,
            reverse_gc: record.reverse.gc,
            reverse_sequence: record.reverse.sequence.clone(),
            probe_start: coords.probe.map(|p| p.start),
            probe_end: coords.probe.map(|p| p.end),
            probe_length: probe.map(|p| p.local_len),
            probe_tm: probe.map(|p| p.tm),
            probe_gc: probe.map(|p| p.gc),
            probe_sequence: probe.map(|p| p.sequence.clone()),
            amplicon_tm: record.amplicon.tm,
            amplicon_gc: coords.amplicon_gc,
            amplicon_length: record.amplicon.product_size,
            amplicon_sequence: coords.amplicon_sequence.clone(),
        }
    }

    pub fn triplet(&self) -> TripletKey {
        TripletKey {
            forward: self.forward_sequence.clone(),
            reverse: self.reverse_sequence.clone(),
            probe: self.probe_sequence.clone(),
        }
    }

    /// Cell values in [`REGION_HEADER`] order
    pub fn fields(&self) -> Vec<String> {
        vec![
            self.index.to_string(),
            self.chromosome.clone(),
            self.forward_start.to_string(),
            self.forward_end.to_string(),
            self.forward_length.to_string(),
            self.forward_tm.to_string(),
            self.forward_gc.to_string(),
            self.forward_sequence.clone(),
            self.reverse_start.to_string(),
            self.reverse_end.to_string(),
            self.reverse_length.to_string(),
            self.reverse_tm.to_string(),
            self.reverse_gc.to_string(),
            self.reverse_sequence.clone(),
            opt(&self.probe_start),
            opt(&self.probe_end),
            opt(&self.probe_length),
            opt(&self.probe_tm),
            opt(&self.probe_gc),
            opt(&self.probe_sequence),
            self.amplicon_tm.to_string(),
            self.amplicon_gc.to_string(),
            self.amplicon_length.to_string(),
            self.amplicon_sequence.clone(),
        ]
    }
}

/// Map every candidate to absolute coordinates
pub fn rows_from_records(records: &[CandidateRecord]) -> Vec<RegionRow> {
    records
        .iter()
        .map(|r| RegionRow::from_record(r, &map_record(r)))
        .collect()
}

pub(crate) fn tsv_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| QpcrError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| QpcrError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    writeln!(
        writer,
        "# Generated: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )
    .map_err(|e| QpcrError::io(path, e))?;
    writeln!(writer, "# qpcr-eval v{}", env!("CARGO_PKG_VERSION"))
        .map_err(|e| QpcrError::io(path, e))?;

    Ok(csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer))
}

pub(crate) fn tsv_reader(path: &Path) -> Result<csv::Reader<File>> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .comment(Some(b'#'))
        .from_path(path)
        .map_err(|e| QpcrError::csv(path, e))
}

/// Write a region table; an empty slice still produces the header
pub fn write_region_table(path: &Path, rows: &[RegionRow]) -> Result<()> {
    let mut writer = tsv_writer(path)?;
    writer
        .write_record(REGION_HEADER)
        .map_err(|e| QpcrError::csv(path, e))?;
    for row in rows {
        writer
            .write_record(row.fields())
            .map_err(|e| QpcrError::csv(path, e))?;
    }
    writer.flush().map_err(|e| QpcrError::io(path, e))?;
    Ok(())
}

pub fn read_region_table(path: &Path) -> Result<Vec<RegionRow>> {
    let mut reader = tsv_reader(path)?;
    let mut rows = Vec::new();
    for (row_num, result) in reader.deserialize::<RegionRow>().enumerate() {
        let row = result.map_err(|e| {
            QpcrError::parse(
                path.display().to_string(),
                format!("row {}: {}", row_num + 1, e),
            )
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// List `*.tsv` files in a directory, sorted by file name so that every traversal of
/// the same directory sees the same order
pub fn list_tables(dir: &Path, extension: &str) -> Result<Vec<std::path::PathBuf>> {
    let mut files: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| QpcrError::io(dir, e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().and_then(|s| s.to_str()) == Some(extension)
        })
        .collect();
    files.sort();
    Ok(files)
}
