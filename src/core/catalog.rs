// catalog.rs - Content-addressed catalog of unique primer/probe sequences

use crate::data::loaders::tsv::RegionRow;
use crate::error::{QpcrError, Result};
use crc32fast::Hasher;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// Dense, zero-based catalog identifier. Rendered as `p<N>` in FASTA headers, the
/// JSON mapping and the aligner's query column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogId(pub u32);

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

impl FromStr for CatalogId {
    type Err = QpcrError;

    fn from_str(s: &str) -> Result<Self> {
        s.strip_prefix('p')
            .and_then(|n| n.parse::<u32>().ok())
            .map(CatalogId)
            .ok_or_else(|| QpcrError::parse("catalog id", format!("'{}' is not a p<N> label", s)))
    }
}

/// Build-phase catalog. Ids are handed out in first-seen order.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    ids: HashMap<String, CatalogId>,
    sequences: Vec<String>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sequence, returning its existing id when already seen
    pub fn insert(&mut self, sequence: &str) -> CatalogId {
        if let Some(id) = self.ids.get(sequence) {
            return *id;
        }
        let id = CatalogId(self.sequences.len() as u32);
        self.ids.insert(sequence.to_string(), id);
        self.sequences.push(sequence.to_string());
        id
    }

    /// Forward, reverse, then probe of each row, in row order
    pub fn insert_rows(&mut self, rows: &[RegionRow]) {
        for row in rows {
            self.insert(&row.forward_sequence);
            self.insert(&row.reverse_sequence);
            if let Some(probe) = &row.probe_sequence {
                self.insert(probe);
            }
        }
    }

    pub fn freeze(self) -> PrimerCatalog {
        PrimerCatalog {
            ids: self.ids,
            sequences: self.sequences,
        }
    }
}

/// Frozen catalog, shared read-only across the parallel stages
#[derive(Debug, Clone, PartialEq)]
pub struct PrimerCatalog {
    ids: HashMap<String, CatalogId>,
    sequences: Vec<String>,
}

impl PrimerCatalog {
    /// Build the catalog from region tables visited in the given order
    pub fn from_region_tables(tables: &[Vec<RegionRow>]) -> Self {
        let mut builder = CatalogBuilder::new();
        for rows in tables {
            builder.insert_rows(rows);
        }
        builder.freeze()
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn id_of(&self, sequence: &str) -> Result<CatalogId> {
        self.ids
            .get(sequence)
            .copied()
            .ok_or_else(|| QpcrError::CatalogMiss {
                key: sequence.to_string(),
            })
    }

    pub fn sequence_of(&self, id: CatalogId) -> Result<&str> {
        self.sequences
            .get(id.0 as usize)
            .map(|s| s.as_str())
            .ok_or_else(|| QpcrError::CatalogMiss {
                key: id.to_string(),
            })
    }

    pub fn contains_id(&self, id: CatalogId) -> bool {
        (id.0 as usize) < self.sequences.len()
    }

    /// Entries in id order
    pub fn iter(&self) -> impl Iterator<Item = (CatalogId, &str)> {
        self.sequences
            .iter()
            .enumerate()
            .map(|(i, s)| (CatalogId(i as u32), s.as_str()))
    }

    /// CRC32 over the id-ordered sequences; equal fingerprints mean equal id assignment
    pub fn fingerprint(&self) -> u32 {
        let mut hasher = Hasher::new();
        for sequence in &self.sequences {
            hasher.update(sequence.as_bytes());
            hasher.update(b"\n");
        }
        hasher.finalize()
    }

    pub fn write_fasta(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| QpcrError::io(path, e))?;
        let mut writer = bio::io::fasta::Writer::new(BufWriter::new(file));
        for (id, sequence) in self.iter() {
            writer
                .write(&id.to_string(), None, sequence.as_bytes())
                .map_err(|e| QpcrError::io(path, e))?;
        }
        writer.flush().map_err(|e| QpcrError::io(path, e))?;
        Ok(())
    }

    /// Sequence -> label mapping as JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let mapping: BTreeMap<&str, String> = self
            .iter()
            .map(|(id, sequence)| (sequence, id.to_string()))
            .collect();
        let file = File::create(path).map_err(|e| QpcrError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &mapping).map_err(|e| QpcrError::json(path, e))?;
        writer.flush().map_err(|e| QpcrError::io(path, e))?;
        Ok(())
    }

    /// Reload a mapping written by [`PrimerCatalog::write_json`]. Ids must be dense.
    pub fn read_json(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| QpcrError::io(path, e))?;
        let mapping: HashMap<String, String> =
            serde_json::from_str(&content).map_err(|e| QpcrError::json(path, e))?;

        let mut slots: Vec<Option<String>> = vec![None; mapping.len()];
        for (sequence, label) in mapping {
            let id: CatalogId = label.parse()?;
            let slot = slots.get_mut(id.0 as usize).ok_or_else(|| {
                QpcrError::parse(
                    path.display().to_string(),
                    format!("catalog id {} is outside the dense range", id),
                )
            })?;
            if slot.is_some() {
                return Err(QpcrError::parse(
                    path.display().to_string(),
                    format!("catalog id {} is assigned twice", id),
                ));
            }
            *slot = Some(sequence);
        }

        let mut builder = CatalogBuilder::new();
        for sequence in slots.into_iter().flatten() {
            builder.insert(&sequence);
        }
        Ok(builder.freeze())
    }
}
