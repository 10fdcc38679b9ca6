// main.rs - CLI entry point

use qpcr_eval::cli::args::{AmpliconArgs, DegenerateArgs, DesignArgs, InclusivityArgs};
use qpcr_eval::cli::validation::require_dir;
use qpcr_eval::cli::Config;
use qpcr_eval::core::pipeline::{
    amplicon_stage, catalog_stage, degenerate_stage, design_inputs, inclusivity_stage, parse_stage,
};
use qpcr_eval::prelude::*;
use std::path::Path;
use std::time::Instant;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), String> {
    let mut args: Args = argh::from_env();

    // Handle generate config first
    if let Command::GenerateConfig(generate) = &args.command {
        let sample_config = Config::generate_sample();
        match &generate.output {
            Some(path) => {
                std::fs::write(path, &sample_config)
                    .map_err(|e| format!("Failed to write config file '{}': {}", path, e))?;
                println!("📄 Sample configuration written to: {}", path);
            }
            None => {
                println!("{}", sample_config);
                println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
            }
        }
        return Ok(());
    }

    // Load configuration file if specified
    if let Some(config_path) = args.config.clone() {
        args = args.with_config_file(&config_path)?;
    }

    let workdir = Workdir::new(args.workdir.as_deref().unwrap_or("qpcr_analysis"));

    println!("🚀 qpcr-eval v{}", env!("CARGO_PKG_VERSION"));
    println!("📁 Workdir: {}", workdir.root().display());

    // Configure thread pool
    let threads = match args.threads {
        Some(n) => {
            rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build_global()
                .map_err(|e| format!("Failed to configure thread pool: {}", e))?;
            println!("🧵 Threads: {}", n);
            n
        }
        None => {
            let n = rayon::current_num_threads();
            println!("🧵 Threads: {} (auto-detected)", n);
            n
        }
    };

    let total_start = Instant::now();
    match &args.command {
        Command::Design(a) => run_design(&workdir, a, threads)?,
        Command::Parse(_) => run_parse(&workdir)?,
        Command::Catalog(_) => run_catalog(&workdir)?,
        Command::Inclusivity(a) => run_inclusivity(&workdir, a)?,
        Command::Amplicon(a) => run_amplicon(&workdir, a, threads)?,
        Command::Degenerate(a) => run_degenerate(&workdir, a)?,
        Command::GenerateConfig(_) => {}
    }

    println!(
        "\n⏱️  Total execution time: {:.2}s",
        total_start.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Run shell commands through the executor and report failures
fn run_commands(commands: &[String], jobs: usize) -> Result<(), String> {
    println!("\n🔄 Running {} commands ({} parallel)...", commands.len(), jobs);
    let executor = ShellExecutor::default();
    let outcomes = executor.run_all(commands, jobs);

    let failed: Vec<&CommandOutcome> = outcomes.iter().filter(|o| !o.success).collect();
    for outcome in failed.iter().take(10) {
        eprintln!(
            "⚠️  Command failed (exit {:?}): {}\n    {}",
            outcome.exit_code,
            outcome.command,
            outcome.stderr.trim()
        );
    }
    if !failed.is_empty() {
        return Err(format!("{} of {} commands failed", failed.len(), outcomes.len()));
    }
    println!("✅ All {} commands completed", outcomes.len());
    Ok(())
}

fn report_failures<T: std::fmt::Display>(failures: &[(T, String)]) {
    for (unit, error) in failures {
        eprintln!("⚠️  {}: {}", unit, error);
    }
}

fn run_design(workdir: &Workdir, args: &DesignArgs, threads: usize) -> Result<(), String> {
    println!("\n🧬 Preparing primer3 inputs from: {}", args.regions);
    let primer3_core = args.primer3_core.as_deref().unwrap_or("primer3_core");
    let commands = design_inputs(
        workdir,
        Path::new(&args.regions),
        args.settings.as_deref().map(Path::new),
        primer3_core,
    )
    .map_err(|e| e.to_string())?;
    println!("✅ {} primer3 inputs written", commands.len());
    println!("📄 Command list: {}", workdir.primer3_script().display());

    if args.run {
        run_commands(&commands, threads)?;
    }
    Ok(())
}

fn run_parse(workdir: &Workdir) -> Result<(), String> {
    require_dir(&workdir.primer3_out(), "design --run")?;
    println!("\n🔄 Parsing primer3 output...");
    let summary = parse_stage(workdir).map_err(|e| e.to_string())?;

    println!("📊 Files: {}", summary.files);
    println!("📊 Region tables written: {}", summary.tables_written);
    println!("📊 Candidate records: {}", summary.records);
    if !summary.failures.is_empty() {
        let failures: Vec<(String, String)> = summary
            .failures
            .iter()
            .map(|(p, e)| (p.display().to_string(), e.clone()))
            .collect();
        report_failures(&failures);
        println!("⚠️  {} files failed to parse", failures.len());
    }
    Ok(())
}

fn run_catalog(workdir: &Workdir) -> Result<(), String> {
    require_dir(&workdir.primer3_parse(), "parse")?;
    println!("\n🔨 Building primer catalog...");
    let catalog = catalog_stage(workdir).map_err(|e| e.to_string())?;

    println!("📊 Unique sequences: {}", catalog.len());
    println!("🔑 Fingerprint: {:08x}", catalog.fingerprint());
    println!("✅ Catalog FASTA written to: {}", workdir.catalog_fasta().display());
    println!("✅ Catalog mapping written to: {}", workdir.catalog_json().display());
    Ok(())
}

fn run_inclusivity(workdir: &Workdir, args: &InclusivityArgs) -> Result<(), String> {
    require_dir(&workdir.primer3_parse(), "parse")?;
    let validation = validate_inclusivity(args)?;
    let matcher = InclusivityMatcher::new(validation.matcher_config);
    let config = matcher.config();
    println!(
        "\n🎯 Inclusivity: product span ({}, {}), 3' tolerance {}",
        config.min_product_len, config.max_product_len, config.max_three_prime_mismatch
    );

    let summary =
        inclusivity_stage(workdir, &matcher, &validation.policy).map_err(|e| e.to_string())?;

    println!("📊 Region tables: {}", summary.tables);
    println!("📊 Retained triplets: {}", summary.retained);
    if !summary.failures.is_empty() {
        let failures: Vec<(String, String)> = summary
            .failures
            .iter()
            .map(|(p, e)| (p.display().to_string(), e.clone()))
            .collect();
        report_failures(&failures);
        println!("⚠️  {} tables failed", failures.len());
    }
    println!(
        "✅ {} rows merged into: {}",
        summary.merged_rows,
        workdir.inclusivity_table().display()
    );
    Ok(())
}

fn run_amplicon(workdir: &Workdir, args: &AmpliconArgs, threads: usize) -> Result<(), String> {
    require_dir(&workdir.primer3_parse(), "parse")?;
    let validation = validate_amplicon(args)?;
    println!(
        "\n🧬 Amplicon extraction scripts (top {} per region) against: {}",
        validation.top_per_region,
        validation.reference.display()
    );

    let launchers = amplicon_stage(
        workdir,
        &validation.reference,
        &validation.tools,
        validation.top_per_region,
    )
    .map_err(|e| e.to_string())?;
    println!("✅ {} triplet scripts written", launchers.len());
    println!("📄 Command list: {}", workdir.amplicon_script().display());

    if args.run {
        run_commands(&launchers, threads)?;
    }
    Ok(())
}

fn run_degenerate(workdir: &Workdir, args: &DegenerateArgs) -> Result<(), String> {
    require_dir(&workdir.degenerate(), "amplicon --run")?;
    let validation = validate_degenerate(args)?;
    let settings = &validation.settings;
    println!(
        "\n🧮 Degenerate consensus (min inclusivity {}, base fraction > {})",
        settings.min_inclusivity, settings.builder.min_fraction
    );

    let summary =
        degenerate_stage(workdir, &validation.reference, settings).map_err(|e| e.to_string())?;

    println!("📊 Triplets: {}", summary.triplets);
    println!("📊 Below inclusivity threshold: {}", summary.below_threshold);
    println!("📊 Consensus results: {}", summary.results.len());
    if !summary.failures.is_empty() {
        let failures: Vec<(String, String)> = summary
            .failures
            .iter()
            .map(|(t, e)| (t.dir_name(), e.clone()))
            .collect();
        report_failures(&failures);
        println!("⚠️  {} triplets failed", failures.len());
    }
    Ok(())
}
