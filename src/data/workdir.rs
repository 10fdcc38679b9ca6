// workdir.rs - On-disk layout of an analysis working directory

use std::path::{Path, PathBuf};

/// Paths of every stage input and output under one analysis directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workdir {
    root: PathBuf,
}

impl Workdir {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Per-region primer3 input files (`<region>.p3`)
    pub fn primer3_in(&self) -> PathBuf {
        self.root.join("primer3_in")
    }

    /// Raw primer3 output (`<region>.out`)
    pub fn primer3_out(&self) -> PathBuf {
        self.root.join("primer3_out")
    }

    /// Parsed region tables (`<region>.tsv`)
    pub fn primer3_parse(&self) -> PathBuf {
        self.root.join("primer3_parse")
    }

    pub fn shell(&self) -> PathBuf {
        self.root.join("shell")
    }

    pub fn primer3_script(&self) -> PathBuf {
        self.shell().join("primer3_batch.sh")
    }

    pub fn amplicon_script(&self) -> PathBuf {
        self.shell().join("amplicon_extractor.sh")
    }

    pub fn blast(&self) -> PathBuf {
        self.root.join("blast")
    }

    pub fn catalog_fasta(&self) -> PathBuf {
        self.blast().join("primers.fasta")
    }

    pub fn catalog_json(&self) -> PathBuf {
        self.blast().join("primers.json")
    }

    /// Aligner output for the catalog FASTA
    pub fn hit_table(&self) -> PathBuf {
        self.blast().join("primers.out")
    }

    /// Per-region inclusivity tables
    pub fn inclusivity(&self) -> PathBuf {
        self.root.join("inclusivity")
    }

    pub fn inclusivity_table(&self) -> PathBuf {
        self.root.join("inclusivity.tsv")
    }

    /// One directory per triplet with extracted amplicons and probe matches
    pub fn degenerate(&self) -> PathBuf {
        self.root.join("inclusivity_and_degenerate")
    }

    pub fn triplet_dir(&self, dir_name: &str) -> PathBuf {
        self.degenerate().join(dir_name)
    }

    pub fn degenerate_table(&self) -> PathBuf {
        self.root.join("degenerate.tsv")
    }
}

/// Files written into each triplet directory by the extraction commands
pub mod triplet_files {
    pub const INCL_AMPLICON: &str = "incl.amplicon.fa";
    pub const INCL_PROBE: &str = "incl.probe.fa";
    pub const DGNRT_AMPLICON: &str = "dgnrt.amplicon.fa";
    pub const DGNRT_PROBE: &str = "dgnrt.probe.fa";
    pub const RESULT: &str = "inclusivity_and_degenerate.txt";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let wd = Workdir::new("/tmp/run");
        assert_eq!(wd.catalog_json(), PathBuf::from("/tmp/run/blast/primers.json"));
        assert_eq!(
            wd.triplet_dir("AC-GT-TT"),
            PathBuf::from("/tmp/run/inclusivity_and_degenerate/AC-GT-TT")
        );
        assert_eq!(
            wd.primer3_script(),
            PathBuf::from("/tmp/run/shell/primer3_batch.sh")
        );
    }
}
