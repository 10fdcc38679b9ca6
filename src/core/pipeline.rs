// pipeline.rs - Stage drivers over an analysis working directory

use crate::core::batch::process_units;
use crate::core::catalog::PrimerCatalog;
use crate::core::degenerate::{ConsensusBuilder, ConsensusPrimer};
use crate::core::inclusivity::{InclusivityMatcher, PrimerTriplet, RetentionPolicy};
use crate::data::alignment::HitIndex;
use crate::data::loaders::blast::read_hit_table;
use crate::data::loaders::primer3::parse_primer3_file;
use crate::data::loaders::tsv::{
    list_tables, read_region_table, rows_from_records, write_region_table, RegionRow,
};
use crate::data::record::TripletKey;
use crate::data::sequences::{
    count_fasta_records, read_fasta, read_nonempty_sequences, reverse_complement,
};
use crate::data::workdir::{triplet_files, Workdir};
use crate::error::{QpcrError, Result};
use crate::output::{
    merge_inclusivity_tables, write_command_list, write_degenerate_result,
    write_degenerate_summary, write_inclusivity_table, DegenerateResult, InclusivityRow,
};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| QpcrError::io(path, e))
}

// ---------------------------------------------------------------------------
// design
// ---------------------------------------------------------------------------

/// Write one primer3 input per region and the command list that runs them.
/// Returns the commands in region order.
pub fn design_inputs(
    workdir: &Workdir,
    regions_fasta: &Path,
    settings_template: Option<&Path>,
    primer3_core: &str,
) -> Result<Vec<String>> {
    let template = match settings_template {
        Some(path) => fs::read_to_string(path).map_err(|e| QpcrError::io(path, e))?,
        None => String::new(),
    };
    let input_dir = workdir.primer3_in();
    let output_dir = workdir.primer3_out();
    create_dir(&input_dir)?;
    create_dir(&output_dir)?;

    let mut commands = Vec::new();
    for region in read_fasta(regions_fasta)? {
        let name = region.id.replace(':', "_");
        let input = input_dir.join(format!("{}.p3", name));
        let mut content = format!(
            "SEQUENCE_ID={}\nSEQUENCE_TEMPLATE={}\n",
            name,
            String::from_utf8_lossy(&region.sequence)
        );
        content.push_str(&template);
        if !content.ends_with("=\n") {
            if !content.ends_with('\n') {
                content.push('\n');
            }
            content.push_str("=\n");
        }
        fs::write(&input, content).map_err(|e| QpcrError::io(&input, e))?;

        commands.push(format!(
            "{} < {} > {}",
            primer3_core,
            input.display(),
            output_dir.join(format!("{}.out", name)).display()
        ));
    }

    write_command_list(&workdir.primer3_script(), &commands)?;
    log::info!("design: {} primer3 inputs in {}", commands.len(), input_dir.display());
    Ok(commands)
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ParseSummary {
    pub files: usize,
    pub tables_written: usize,
    pub records: usize,
    pub failures: Vec<(PathBuf, String)>,
}

/// Parse every `primer3_out/*.out` into a region table. Files yielding no candidates
/// produce no table; a malformed file is reported and the rest continue.
pub fn parse_stage(workdir: &Workdir) -> Result<ParseSummary> {
    let files = list_tables(&workdir.primer3_out(), "out")?;
    let parse_dir = workdir.primer3_parse();
    create_dir(&parse_dir)?;

    let report = process_units(files, "parse", |path: &PathBuf| -> Result<usize> {
        let records = parse_primer3_file(path)?;
        if records.is_empty() {
            log::debug!("{}: no candidates", path.display());
            return Ok(0);
        }
        let rows = rows_from_records(&records);
        write_region_table(&parse_dir.join(format!("{}.tsv", file_stem(path))), &rows)?;
        Ok(rows.len())
    });

    let mut summary = ParseSummary {
        files: report.len(),
        ..Default::default()
    };
    for (_, count) in report.succeeded() {
        if *count > 0 {
            summary.tables_written += 1;
            summary.records += count;
        }
    }
    summary.failures = report
        .failed()
        .map(|(path, e)| (path.clone(), e.to_string()))
        .collect();
    Ok(summary)
}

// ---------------------------------------------------------------------------
// catalog
// ---------------------------------------------------------------------------

/// Build the catalog from every region table in file-name order and export it.
/// Runs sequentially; nothing alignment-dependent may start before it returns.
pub fn catalog_stage(workdir: &Workdir) -> Result<PrimerCatalog> {
    let tables = list_tables(&workdir.primer3_parse(), "tsv")?;
    let mut loaded = Vec::with_capacity(tables.len());
    for table in &tables {
        loaded.push(read_region_table(table)?);
    }
    let catalog = PrimerCatalog::from_region_tables(&loaded);

    create_dir(&workdir.blast())?;
    catalog.write_fasta(&workdir.catalog_fasta())?;
    catalog.write_json(&workdir.catalog_json())?;
    log::info!(
        "catalog: {} sequences from {} tables (fingerprint {:08x})",
        catalog.len(),
        tables.len(),
        catalog.fingerprint()
    );
    Ok(catalog)
}

// ---------------------------------------------------------------------------
// inclusivity
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InclusivitySummary {
    pub tables: usize,
    pub retained: usize,
    pub merged_rows: usize,
    pub failures: Vec<(PathBuf, String)>,
}

/// Evaluate every row of one region table and keep the retained ones
pub fn evaluate_table(
    rows: &[RegionRow],
    catalog: &PrimerCatalog,
    index: &HitIndex,
    matcher: &InclusivityMatcher,
    policy: &RetentionPolicy,
) -> Result<Vec<InclusivityRow>> {
    let mut retained = Vec::new();
    for row in rows {
        let triplet = PrimerTriplet::from_row(row, catalog)?;
        let result = matcher.evaluate(&triplet, index);
        if policy.retains(&result) {
            retained.push(InclusivityRow {
                hits: result.joined(),
                region: row.clone(),
            });
        }
    }
    Ok(retained)
}

/// Match every region table against the aligner's hits and merge the non-empty
/// per-region results. A catalog miss in any table aborts the stage.
pub fn inclusivity_stage(
    workdir: &Workdir,
    matcher: &InclusivityMatcher,
    policy: &RetentionPolicy,
) -> Result<InclusivitySummary> {
    let catalog = PrimerCatalog::read_json(&workdir.catalog_json())?;
    let index = read_hit_table(&workdir.hit_table(), &catalog)?;
    log::info!(
        "inclusivity: {} hits for {} catalog ids over {} subjects",
        index.total_hits(),
        index.queries(),
        index.subject_count()
    );

    let tables = list_tables(&workdir.primer3_parse(), "tsv")?;
    let out_dir = workdir.inclusivity();
    create_dir(&out_dir)?;

    let report = process_units(tables, "inclusivity", |table: &PathBuf| -> Result<(PathBuf, usize)> {
        let rows = read_region_table(table)?;
        let retained = evaluate_table(&rows, &catalog, &index, matcher, policy)?;
        let out = out_dir.join(format!("{}.tsv", file_stem(table)));
        write_inclusivity_table(&out, &retained)?;
        Ok((out, retained.len()))
    });

    let mut summary = InclusivitySummary {
        tables: report.len(),
        ..Default::default()
    };
    let mut written = Vec::new();
    for outcome in report.outcomes {
        match outcome.result {
            Ok((out, count)) => {
                summary.retained += count;
                written.push(out);
            }
            Err(e @ QpcrError::CatalogMiss { .. }) => return Err(e),
            Err(e) => summary.failures.push((outcome.unit, e.to_string())),
        }
    }

    written.sort();
    summary.merged_rows = merge_inclusivity_tables(&written, &workdir.inclusivity_table())?;
    Ok(summary)
}

// ---------------------------------------------------------------------------
// amplicon extraction
// ---------------------------------------------------------------------------

/// First `top_n` rows of each region table, duplicate triplets dropped, first-seen order
pub fn select_triplets(tables: &[PathBuf], top_n: usize) -> Result<Vec<TripletKey>> {
    let mut seen = HashSet::new();
    let mut selected = Vec::new();
    for table in tables {
        for row in read_region_table(table)?.into_iter().take(top_n) {
            let key = row.triplet();
            if seen.insert(key.clone()) {
                selected.push(key);
            }
        }
    }
    Ok(selected)
}

/// External tools and mismatch limits of the extraction commands
#[derive(Debug, Clone, PartialEq)]
pub struct AmpliconTools {
    pub amplicon_extractor: String,
    pub seqkit: String,
    /// Primer mismatches allowed when extracting inclusivity amplicons
    pub extractor_max_mismatch: usize,
    /// Primer mismatches allowed when extracting amplicons for consensus
    pub amplicon_max_mismatch: usize,
    /// Probe mismatches allowed when locating the probe inside amplicons
    pub probe_max_mismatch: usize,
}

impl Default for AmpliconTools {
    fn default() -> Self {
        Self {
            amplicon_extractor: "amplicon-extractor".to_string(),
            seqkit: "seqkit".to_string(),
            extractor_max_mismatch: 6,
            amplicon_max_mismatch: 3,
            probe_max_mismatch: 6,
        }
    }
}

impl AmpliconTools {
    fn seqkit_amplicon(&self, max_mismatch: usize) -> String {
        format!(
            "{} amplicon --only-positive-strand --output-mismatches --line-width 0 --max-mismatch {}",
            self.seqkit, max_mismatch
        )
    }

    /// Commands producing the four FASTA files of one triplet directory
    pub fn commands(&self, triplet: &TripletKey, reference: &Path, dir: &Path) -> Vec<String> {
        let d = dir.display();
        let mut commands = vec![
            format!("mkdir -p {}", d),
            format!(
                "{} -F {} -m {} -f {} -r {} -o {}/{}",
                self.amplicon_extractor,
                reference.display(),
                self.extractor_max_mismatch,
                triplet.forward,
                triplet.reverse,
                d,
                triplet_files::INCL_AMPLICON
            ),
        ];
        if let Some(probe) = &triplet.probe {
            commands.push(format!(
                "{} --forward {} {}/{} > {}/{}",
                self.seqkit_amplicon(self.probe_max_mismatch),
                probe,
                d,
                triplet_files::INCL_AMPLICON,
                d,
                triplet_files::INCL_PROBE
            ));
        }
        commands.push(format!(
            "{} --forward {} --reverse {} {} > {}/{}",
            self.seqkit_amplicon(self.amplicon_max_mismatch),
            triplet.forward,
            triplet.reverse,
            reference.display(),
            d,
            triplet_files::DGNRT_AMPLICON
        ));
        if let Some(probe) = &triplet.probe {
            commands.push(format!(
                "{} --forward {} {}/{} > {}/{}",
                self.seqkit_amplicon(self.probe_max_mismatch),
                probe,
                d,
                triplet_files::DGNRT_AMPLICON,
                d,
                triplet_files::DGNRT_PROBE
            ));
        }
        commands
    }
}

/// Write one extraction script per selected triplet plus the list that runs them.
/// Returns the `bash <script>` commands in triplet order.
pub fn amplicon_stage(
    workdir: &Workdir,
    reference: &Path,
    tools: &AmpliconTools,
    top_n: usize,
) -> Result<Vec<String>> {
    let tables = list_tables(&workdir.primer3_parse(), "tsv")?;
    let triplets = select_triplets(&tables, top_n)?;
    let script_dir = workdir.shell().join("amplicon_extractor");
    create_dir(&script_dir)?;
    create_dir(&workdir.degenerate())?;

    let mut launchers = Vec::with_capacity(triplets.len());
    for triplet in &triplets {
        let name = triplet.dir_name();
        let script = script_dir.join(format!("{}.sh", name));
        let commands = tools.commands(triplet, reference, &workdir.triplet_dir(&name));
        write_command_list(&script, &commands)?;
        launchers.push(format!("bash {}", script.display()));
    }

    write_command_list(&workdir.amplicon_script(), &launchers)?;
    log::info!("amplicon: {} triplets from {} tables", triplets.len(), tables.len());
    Ok(launchers)
}

// ---------------------------------------------------------------------------
// degenerate
// ---------------------------------------------------------------------------

/// Included fraction of the reference set for one triplet directory.
/// Triplets with a probe count probe matches, pairs count extracted amplicons.
pub fn amplicon_inclusivity(dir: &Path, has_probe: bool, reference_count: usize) -> Result<f64> {
    let matched = if has_probe {
        dir.join(triplet_files::INCL_PROBE)
    } else {
        dir.join(triplet_files::INCL_AMPLICON)
    };
    let included = count_fasta_records(&matched)?;
    if reference_count == 0 || included == 0 {
        return Ok(0.0);
    }
    Ok(included as f64 / reference_count as f64)
}

/// Leading `len` bases, or the whole sequence when shorter
fn prefix(sequence: &[u8], len: usize) -> Vec<u8> {
    sequence[..len.min(sequence.len())].to_vec()
}

/// Consensus forward, reverse and probe from the extracted amplicons of one triplet
pub fn triplet_consensus(
    triplet: &TripletKey,
    dir: &Path,
    builder: &ConsensusBuilder,
) -> Result<(ConsensusPrimer, ConsensusPrimer, Option<ConsensusPrimer>)> {
    let amplicons = read_nonempty_sequences(&dir.join(triplet_files::DGNRT_AMPLICON))?;
    let forward: Vec<Vec<u8>> = amplicons
        .iter()
        .map(|a| prefix(a, triplet.forward.len()))
        .collect();
    let reverse: Vec<Vec<u8>> = amplicons
        .iter()
        .map(|a| prefix(&reverse_complement(a), triplet.reverse.len()))
        .collect();

    let forward = builder.build(&forward)?;
    let reverse = builder.build(&reverse)?;
    let probe = match triplet.probe {
        Some(_) => {
            let probes = read_nonempty_sequences(&dir.join(triplet_files::DGNRT_PROBE))?;
            Some(builder.build(&probes)?)
        }
        None => None,
    };
    Ok((forward, reverse, probe))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegenerateSettings {
    pub top_per_region: usize,
    /// Triplets with a lower amplicon inclusivity are skipped
    pub min_inclusivity: f64,
    pub builder: ConsensusBuilder,
}

impl Default for DegenerateSettings {
    fn default() -> Self {
        Self {
            top_per_region: 5,
            min_inclusivity: 0.5,
            builder: ConsensusBuilder::default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct DegenerateSummary {
    pub triplets: usize,
    pub results: Vec<DegenerateResult>,
    pub below_threshold: usize,
    pub failures: Vec<(TripletKey, String)>,
}

/// Inclusivity and consensus of one triplet; `None` when below the threshold
pub fn evaluate_triplet(
    triplet: &TripletKey,
    dir: &Path,
    reference_count: usize,
    settings: &DegenerateSettings,
) -> Result<Option<DegenerateResult>> {
    let inclusivity = amplicon_inclusivity(dir, triplet.probe.is_some(), reference_count)?;
    if inclusivity < settings.min_inclusivity {
        return Ok(None);
    }
    let (forward, reverse, probe) = triplet_consensus(triplet, dir, &settings.builder)?;
    let result = DegenerateResult {
        triplet: triplet.clone(),
        forward,
        reverse,
        probe,
        inclusivity,
    };
    write_degenerate_result(&dir.join(triplet_files::RESULT), &result)?;
    Ok(Some(result))
}

/// Consensus primers for every selected triplet whose extraction results exist
pub fn degenerate_stage(
    workdir: &Workdir,
    reference: &Path,
    settings: &DegenerateSettings,
) -> Result<DegenerateSummary> {
    let reference_count = count_fasta_records(reference)?;
    let tables = list_tables(&workdir.primer3_parse(), "tsv")?;
    let triplets = select_triplets(&tables, settings.top_per_region)?;
    log::info!(
        "degenerate: {} triplets against {} reference sequences",
        triplets.len(),
        reference_count
    );

    let report = process_units(triplets, "degenerate", |triplet: &TripletKey| {
        let dir = workdir.triplet_dir(&triplet.dir_name());
        evaluate_triplet(triplet, &dir, reference_count, settings)
    });

    let mut summary = DegenerateSummary {
        triplets: report.len(),
        ..Default::default()
    };
    for outcome in report.outcomes {
        match outcome.result {
            Ok(Some(result)) => summary.results.push(result),
            Ok(None) => summary.below_threshold += 1,
            Err(e) => summary.failures.push((outcome.unit, e.to_string())),
        }
    }

    write_degenerate_summary(&workdir.degenerate_table(), &summary.results)?;
    Ok(summary)
}
