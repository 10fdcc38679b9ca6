// config.rs - Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    // Input/Output
    pub workdir: Option<String>,
    pub reference: Option<String>,

    // Performance
    pub threads: Option<usize>,

    // External tools
    pub primer3_core: Option<String>,
    pub primer3_settings: Option<String>,
    pub amplicon_extractor: Option<String>,
    pub seqkit: Option<String>,

    // Inclusivity matching
    pub min_product_len: Option<i64>,
    pub max_product_len: Option<i64>,
    pub max_three_prime_mismatch: Option<u64>,
    pub min_hit_fraction: Option<f64>,

    // Amplicon extraction
    pub top_per_region: Option<usize>,
    pub extractor_max_mismatch: Option<usize>,
    pub amplicon_max_mismatch: Option<usize>,
    pub probe_max_mismatch: Option<usize>,

    // Degenerate consensus
    pub min_inclusivity: Option<f64>,
    pub min_base_fraction: Option<f64>,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        println!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# qpcr-eval.toml - Configuration file for qpcr-eval
# Command line arguments will override these settings

# =============================================================================
# INPUT/OUTPUT
# =============================================================================

# Analysis working directory (primer3_in, primer3_out, primer3_parse, blast, ...)
workdir = "qpcr_analysis"

# Reference sequence set used for inclusivity (one record per genome/gene copy)
reference = "/path/to/reference.fasta"

# =============================================================================
# PERFORMANCE
# =============================================================================

# Number of threads (omit for auto-detection)
threads = 8

# =============================================================================
# EXTERNAL TOOLS
# =============================================================================

primer3_core = "primer3_core"
primer3_settings = "/path/to/template.p3"
amplicon_extractor = "amplicon-extractor"
seqkit = "seqkit"

# =============================================================================
# INCLUSIVITY MATCHING
# =============================================================================

# Product span (reverse end - forward start) must lie strictly inside this window
min_product_len = 70
max_product_len = 1000

# Hits leaving more unaligned bases at the primer 3' end are discarded
max_three_prime_mismatch = 2

# Minimum fraction of reference subjects a triplet must reach to be written
min_hit_fraction = 0.0

# =============================================================================
# AMPLICON EXTRACTION
# =============================================================================

# Candidates taken from the top of each region table
top_per_region = 5

extractor_max_mismatch = 6
amplicon_max_mismatch = 3
probe_max_mismatch = 6

# =============================================================================
# DEGENERATE CONSENSUS
# =============================================================================

# Triplets with a lower amplicon inclusivity are skipped
min_inclusivity = 0.5

# A base enters the consensus when its column frequency is strictly above this
min_base_fraction = 0.2
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(&Config::generate_sample()).unwrap();
        assert_eq!(config.workdir.as_deref(), Some("qpcr_analysis"));
        assert_eq!(config.min_product_len, Some(70));
        assert_eq!(config.max_three_prime_mismatch, Some(2));
        assert_eq!(config.min_base_fraction, Some(0.2));
        assert_eq!(config.top_per_region, Some(5));
    }

    #[test]
    fn test_partial_config() {
        let config: Config = toml::from_str("threads = 4\n").unwrap();
        assert_eq!(config.threads, Some(4));
        assert!(config.workdir.is_none());
    }
}
