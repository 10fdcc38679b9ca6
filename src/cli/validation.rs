// validation.rs - Input validation utilities

use crate::cli::args::{AmpliconArgs, DegenerateArgs, InclusivityArgs};
use crate::core::inclusivity::{InclusivityConfig, RetentionPolicy};
use crate::core::pipeline::{AmpliconTools, DegenerateSettings};
use crate::core::ConsensusBuilder;
use crate::data::sequences::count_fasta_records;
use std::path::{Path, PathBuf};

pub struct InclusivityValidation {
    pub matcher_config: InclusivityConfig,
    pub policy: RetentionPolicy,
}

pub struct AmpliconValidation {
    pub reference: PathBuf,
    pub tools: AmpliconTools,
    pub top_per_region: usize,
}

pub struct DegenerateValidation {
    pub reference: PathBuf,
    pub settings: DegenerateSettings,
}

fn check_fraction(name: &str, value: f64) -> Result<f64, String> {
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("{} must be between 0.0 and 1.0 (got {})", name, value));
    }
    Ok(value)
}

fn require_reference(reference: &Option<String>) -> Result<PathBuf, String> {
    let reference = reference
        .as_ref()
        .ok_or("--reference is required (or set 'reference' in the config file)")?;
    let path = PathBuf::from(reference);
    if !path.is_file() {
        return Err(format!("Reference file '{}' does not exist", reference));
    }
    Ok(path)
}

fn check_top_per_region(value: Option<usize>) -> Result<usize, String> {
    match value.unwrap_or(5) {
        0 => Err("--top-per-region must be at least 1".to_string()),
        n => Ok(n),
    }
}

/// Validate the inclusivity arguments into matcher thresholds and a retention policy
pub fn validate_inclusivity(args: &InclusivityArgs) -> Result<InclusivityValidation, String> {
    let defaults = InclusivityConfig::default();
    let matcher_config = InclusivityConfig {
        min_product_len: args.min_product_len.unwrap_or(defaults.min_product_len),
        max_product_len: args.max_product_len.unwrap_or(defaults.max_product_len),
        max_three_prime_mismatch: args
            .max_three_prime_mismatch
            .unwrap_or(defaults.max_three_prime_mismatch),
    };
    matcher_config.validate()?;

    let min_fraction = check_fraction("--min-hit-fraction", args.min_hit_fraction.unwrap_or(0.0))?;
    let total_subjects = match &args.reference {
        Some(reference) => {
            let count = count_fasta_records(Path::new(reference))
                .map_err(|e| format!("Failed to read reference '{}': {}", reference, e))?;
            println!("📋 Reference set: {} sequences", count);
            Some(count)
        }
        None => {
            if min_fraction > 0.0 {
                return Err("--min-hit-fraction requires --reference to know the subject total".to_string());
            }
            None
        }
    };

    Ok(InclusivityValidation {
        matcher_config,
        policy: RetentionPolicy {
            min_fraction,
            total_subjects,
        },
    })
}

pub fn validate_amplicon(args: &AmpliconArgs) -> Result<AmpliconValidation, String> {
    let defaults = AmpliconTools::default();
    let tools = AmpliconTools {
        amplicon_extractor: args
            .amplicon_extractor
            .clone()
            .unwrap_or(defaults.amplicon_extractor),
        seqkit: args.seqkit.clone().unwrap_or(defaults.seqkit),
        extractor_max_mismatch: args
            .extractor_max_mismatch
            .unwrap_or(defaults.extractor_max_mismatch),
        amplicon_max_mismatch: args
            .amplicon_max_mismatch
            .unwrap_or(defaults.amplicon_max_mismatch),
        probe_max_mismatch: args.probe_max_mismatch.unwrap_or(defaults.probe_max_mismatch),
    };

    Ok(AmpliconValidation {
        reference: require_reference(&args.reference)?,
        tools,
        top_per_region: check_top_per_region(args.top_per_region)?,
    })
}

pub fn validate_degenerate(args: &DegenerateArgs) -> Result<DegenerateValidation, String> {
    let defaults = DegenerateSettings::default();
    let min_inclusivity = check_fraction(
        "--min-inclusivity",
        args.min_inclusivity.unwrap_or(defaults.min_inclusivity),
    )?;
    let min_base_fraction = check_fraction(
        "--min-base-fraction",
        args.min_base_fraction
            .unwrap_or(defaults.builder.min_fraction),
    )?;

    Ok(DegenerateValidation {
        reference: require_reference(&args.reference)?,
        settings: DegenerateSettings {
            top_per_region: check_top_per_region(args.top_per_region)?,
            min_inclusivity,
            builder: ConsensusBuilder::new(min_base_fraction),
        },
    })
}

/// Existing directory required by a stage
pub fn require_dir(path: &Path, produced_by: &str) -> Result<(), String> {
    if !path.is_dir() {
        return Err(format!(
            "Directory '{}' does not exist (run '{}' first)",
            path.display(),
            produced_by
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inclusivity_args() -> InclusivityArgs {
        InclusivityArgs {
            reference: None,
            min_product_len: None,
            max_product_len: None,
            max_three_prime_mismatch: None,
            min_hit_fraction: None,
        }
    }

    #[test]
    fn test_inclusivity_defaults() {
        let v = validate_inclusivity(&inclusivity_args()).unwrap();
        assert_eq!(v.matcher_config, InclusivityConfig::default());
        assert_eq!(v.policy.total_subjects, None);
    }

    #[test]
    fn test_fraction_without_reference_rejected() {
        let mut args = inclusivity_args();
        args.min_hit_fraction = Some(0.5);
        assert!(validate_inclusivity(&args).is_err());
        args.min_hit_fraction = Some(1.5);
        assert!(validate_inclusivity(&args).is_err());
    }

    #[test]
    fn test_reference_sets_subject_total() {
        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("ref.fa");
        std::fs::write(&reference, ">a\nACGT\n>b\nACGT\n").unwrap();
        let mut args = inclusivity_args();
        args.reference = Some(reference.display().to_string());
        args.min_hit_fraction = Some(0.5);
        let v = validate_inclusivity(&args).unwrap();
        assert_eq!(v.policy.total_subjects, Some(2));
    }

    #[test]
    fn test_degenerate_requires_existing_reference() {
        let args = DegenerateArgs {
            reference: Some("/nonexistent/ref.fa".to_string()),
            top_per_region: None,
            min_inclusivity: None,
            min_base_fraction: None,
        };
        assert!(validate_degenerate(&args).is_err());
    }
}
