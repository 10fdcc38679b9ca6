// blast.rs - Loader for tabular alignment hits keyed by catalog labels

use crate::core::catalog::{CatalogId, PrimerCatalog};
use crate::data::alignment::{AlignmentHit, HitIndex, HitRow};
use crate::error::{QpcrError, Result};
use std::io::Read;
use std::path::Path;

impl HitRow {
    /// Resolve the query label against the catalog
    pub fn into_hit(self, catalog: &PrimerCatalog) -> Result<AlignmentHit> {
        let query: CatalogId = self.qseqid.parse()?;
        if !catalog.contains_id(query) {
            return Err(QpcrError::CatalogMiss { key: self.qseqid });
        }
        Ok(AlignmentHit {
            query,
            subject: self.sseqid,
            strand: self.sstrand,
            alignment_start: self.sstart,
            alignment_end: self.send,
            query_length: self.qlen,
            query_alignment_end: self.qend,
            percent_identity: self.pident,
            evalue: self.evalue,
        })
    }
}

/// Read a headerless 15-column hit table from any reader
pub fn read_hits<R: Read>(reader: R, catalog: &PrimerCatalog, context: &str) -> Result<HitIndex> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut index = HitIndex::new();
    for (line_num, result) in reader.deserialize::<HitRow>().enumerate() {
        let row = result
            .map_err(|e| QpcrError::parse(context, format!("hit line {}: {}", line_num + 1, e)))?;
        index.insert(row.into_hit(catalog)?);
    }
    Ok(index)
}

pub fn read_hit_table(path: &Path, catalog: &PrimerCatalog) -> Result<HitIndex> {
    let file = std::fs::File::open(path).map_err(|e| QpcrError::io(path, e))?;
    read_hits(file, catalog, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::CatalogBuilder;
    use crate::data::alignment::Strand;

    fn catalog() -> PrimerCatalog {
        let mut builder = CatalogBuilder::new();
        builder.insert("ACGTACGTACGTACGTACGT");
        builder.insert("TTTTGGGGCCCCAAAATTTT");
        builder.freeze()
    }

    #[test]
    fn test_read_hits_groups_by_query() {
        let table = "p0\tgenomeA\t20\t20\t5000\t100\t120\t1\t20\t100\t100.000\t20\t0.01\t40.1\tplus\n\
                     p1\tgenomeA\t20\t20\t5000\t370\t350\t1\t20\t100\t95.000\t19\t0.02\t36.2\tminus\n\
                     p0\tgenomeB\t18\t20\t4000\t10\t27\t3\t20\t90\t100.000\t18\t0.05\t34.0\tplus\n";
        let index = read_hits(table.as_bytes(), &catalog(), "test").unwrap();
        assert_eq!(index.total_hits(), 3);
        assert_eq!(index.queries(), 2);
        assert_eq!(index.subject_count(), 2);

        let p1 = index.hits_for(CatalogId(1));
        assert_eq!(p1.len(), 1);
        assert_eq!(p1[0].strand, Strand::Minus);
        assert_eq!(p1[0].alignment_end, 350);
        assert!(index.hits_for(CatalogId(5)).is_empty());
    }

    #[test]
    fn test_unknown_catalog_id_is_a_miss() {
        let table = "p9\tgenomeA\t20\t20\t5000\t100\t120\t1\t20\t100\t100\t20\t0.01\t40\tplus\n";
        assert!(matches!(
            read_hits(table.as_bytes(), &catalog(), "test"),
            Err(QpcrError::CatalogMiss { .. })
        ));
    }

    #[test]
    fn test_bad_strand_is_parse_error() {
        let table = "p0\tgenomeA\t20\t20\t5000\t100\t120\t1\t20\t100\t100\t20\t0.01\t40\tsideways\n";
        assert!(matches!(
            read_hits(table.as_bytes(), &catalog(), "test"),
            Err(QpcrError::Parse { .. })
        ));
    }
}
