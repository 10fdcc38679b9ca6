// merge.rs - Merge configuration file with CLI arguments

use crate::cli::args::Command;
use crate::cli::{Args, Config};

impl Args {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: Config) -> Self {
        // Global
        if self.workdir.is_none() {
            self.workdir = config.workdir;
        }
        if self.threads.is_none() {
            self.threads = config.threads;
        }

        match &mut self.command {
            Command::Design(args) => {
                if args.settings.is_none() {
                    args.settings = config.primer3_settings;
                }
                if args.primer3_core.is_none() {
                    args.primer3_core = config.primer3_core;
                }
            }
            Command::Inclusivity(args) => {
                if args.reference.is_none() {
                    args.reference = config.reference;
                }
                if args.min_product_len.is_none() {
                    args.min_product_len = config.min_product_len;
                }
                if args.max_product_len.is_none() {
                    args.max_product_len = config.max_product_len;
                }
                if args.max_three_prime_mismatch.is_none() {
                    args.max_three_prime_mismatch = config.max_three_prime_mismatch;
                }
                if args.min_hit_fraction.is_none() {
                    args.min_hit_fraction = config.min_hit_fraction;
                }
            }
            Command::Amplicon(args) => {
                if args.reference.is_none() {
                    args.reference = config.reference;
                }
                if args.top_per_region.is_none() {
                    args.top_per_region = config.top_per_region;
                }
                if args.amplicon_extractor.is_none() {
                    args.amplicon_extractor = config.amplicon_extractor;
                }
                if args.seqkit.is_none() {
                    args.seqkit = config.seqkit;
                }
                if args.extractor_max_mismatch.is_none() {
                    args.extractor_max_mismatch = config.extractor_max_mismatch;
                }
                if args.amplicon_max_mismatch.is_none() {
                    args.amplicon_max_mismatch = config.amplicon_max_mismatch;
                }
                if args.probe_max_mismatch.is_none() {
                    args.probe_max_mismatch = config.probe_max_mismatch;
                }
            }
            Command::Degenerate(args) => {
                if args.reference.is_none() {
                    args.reference = config.reference;
                }
                if args.top_per_region.is_none() {
                    args.top_per_region = config.top_per_region;
                }
                if args.min_inclusivity.is_none() {
                    args.min_inclusivity = config.min_inclusivity;
                }
                if args.min_base_fraction.is_none() {
                    args.min_base_fraction = config.min_base_fraction;
                }
            }
            Command::Parse(_) | Command::Catalog(_) | Command::GenerateConfig(_) => {}
        }

        self
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<Self, String> {
        let config = Config::from_file(config_path)?;
        Ok(self.merge_with_config(config))
    }
}
