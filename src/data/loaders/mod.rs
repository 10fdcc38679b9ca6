// mod.rs - Loaders for primer3 output, region tables and alignment hits

pub mod blast;
pub mod primer3;
pub mod tsv;

pub use blast::{read_hit_table, read_hits};
pub use primer3::{parse_block, parse_blocks, parse_primer3_file, parse_sequence_id, RegionId};
pub use tsv::{list_tables, read_region_table, rows_from_records, write_region_table, RegionRow};
