// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs)]
/// qpcr-eval - qPCR primer/probe parsing, inclusivity and degenerate consensus
pub struct Args {
    /// analysis working directory (default: qpcr_analysis)
    #[argh(option)]
    pub workdir: Option<String>,

    /// number of threads (default: auto-detect)
    #[argh(option)]
    pub threads: Option<usize>,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    #[argh(subcommand)]
    pub command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
pub enum Command {
    Design(DesignArgs),
    Parse(ParseArgs),
    Catalog(CatalogArgs),
    Inclusivity(InclusivityArgs),
    Amplicon(AmpliconArgs),
    Degenerate(DegenerateArgs),
    GenerateConfig(GenerateConfigArgs),
}

#[derive(FromArgs)]
/// Write one primer3 input per region and the primer3 command list
#[argh(subcommand, name = "design")]
pub struct DesignArgs {
    /// multi-FASTA of target regions
    #[argh(option)]
    pub regions: String,

    /// primer3 settings appended to every input (Boulder-IO)
    #[argh(option)]
    pub settings: Option<String>,

    /// primer3_core executable (default: primer3_core)
    #[argh(option)]
    pub primer3_core: Option<String>,

    /// run the generated commands
    #[argh(switch)]
    pub run: bool,
}

#[derive(FromArgs)]
/// Parse primer3 output into per-region tables with absolute coordinates
#[argh(subcommand, name = "parse")]
pub struct ParseArgs {}

#[derive(FromArgs)]
/// Build the primer catalog and export primers.fasta / primers.json
#[argh(subcommand, name = "catalog")]
pub struct CatalogArgs {}

#[derive(FromArgs)]
/// Match catalog alignment hits into per-triplet inclusivity tables
#[argh(subcommand, name = "inclusivity")]
pub struct InclusivityArgs {
    /// reference FASTA; its record count is the denominator of --min-hit-fraction
    #[argh(option)]
    pub reference: Option<String>,

    /// exclusive lower bound of the product span (default: 70)
    #[argh(option)]
    pub min_product_len: Option<i64>,

    /// exclusive upper bound of the product span (default: 1000)
    #[argh(option)]
    pub max_product_len: Option<i64>,

    /// unaligned 3' bases tolerated per hit (default: 2)
    #[argh(option)]
    pub max_three_prime_mismatch: Option<u64>,

    /// minimum fraction of reference subjects a triplet must reach (default: 0.0)
    #[argh(option)]
    pub min_hit_fraction: Option<f64>,
}

#[derive(FromArgs)]
/// Write amplicon/probe extraction scripts for the top candidates of each region
#[argh(subcommand, name = "amplicon")]
pub struct AmpliconArgs {
    /// reference FASTA to extract amplicons from
    #[argh(option)]
    pub reference: Option<String>,

    /// candidates taken from the top of each region table (default: 5)
    #[argh(option)]
    pub top_per_region: Option<usize>,

    /// amplicon extractor executable (default: amplicon-extractor)
    #[argh(option)]
    pub amplicon_extractor: Option<String>,

    /// seqkit executable (default: seqkit)
    #[argh(option)]
    pub seqkit: Option<String>,

    /// primer mismatches for inclusivity extraction (default: 6)
    #[argh(option)]
    pub extractor_max_mismatch: Option<usize>,

    /// primer mismatches for consensus extraction (default: 3)
    #[argh(option)]
    pub amplicon_max_mismatch: Option<usize>,

    /// probe mismatches inside amplicons (default: 6)
    #[argh(option)]
    pub probe_max_mismatch: Option<usize>,

    /// run the generated scripts
    #[argh(switch)]
    pub run: bool,
}

#[derive(FromArgs)]
/// Compute amplicon inclusivity and degenerate consensus primers per triplet
#[argh(subcommand, name = "degenerate")]
pub struct DegenerateArgs {
    /// reference FASTA used for extraction
    #[argh(option)]
    pub reference: Option<String>,

    /// candidates taken from the top of each region table (default: 5)
    #[argh(option)]
    pub top_per_region: Option<usize>,

    /// triplets below this amplicon inclusivity are skipped (default: 0.5)
    #[argh(option)]
    pub min_inclusivity: Option<f64>,

    /// a base enters the consensus above this column frequency (default: 0.2)
    #[argh(option)]
    pub min_base_fraction: Option<f64>,
}

#[derive(FromArgs)]
/// Print a sample configuration file, or write it with --output
#[argh(subcommand, name = "generate-config")]
pub struct GenerateConfigArgs {
    /// write the sample to this path instead of stdout
    #[argh(option)]
    pub output: Option<String>,
}
