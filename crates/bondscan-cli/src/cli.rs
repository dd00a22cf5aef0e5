use bondscan::store::database::WhichTopologies;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "bondscan - Infer bond topologies from 3D molecular geometries and query a molecule store by topology.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Infer and print every valid bond topology for the geometries in an XYZ file.
    Infer(InferArgs),
    /// Infer topologies for the geometries in an XYZ file and add them to a store snapshot.
    Ingest(IngestArgs),
    /// Look up stored molecules by precomputed topology fingerprint.
    FindSmiles(FindSmilesArgs),
    /// Re-infer every stored molecule under the current distributions and report those
    /// producing a given fingerprint.
    FindTopology(FindTopologyArgs),
}

/// Options shared by every command that runs topology inference.
#[derive(Args, Debug, Clone, Default)]
pub struct InferenceArgs {
    /// Path to the configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the bond-length CSV file (atom_a, atom_b, order, length, count).
    #[arg(short = 'b', long, value_name = "PATH")]
    pub bond_lengths: Option<PathBuf>,

    /// Override the valence rule file.
    #[arg(long, value_name = "PATH")]
    pub valence_rules: Option<PathBuf>,

    /// Add a bond-length range override, e.g. 'C~C:1.30-1.60' or 'N=N:1.1-1.3'.
    /// Can be used multiple times; added after any overrides in the config file.
    #[arg(short = 'r', long = "range", value_name = "SPEC")]
    pub ranges: Vec<String>,

    /// Override the maximum atom-pair distance considered for bonding (Angstrom).
    #[arg(long, value_name = "FLOAT")]
    pub distance_cutoff: Option<f64>,

    /// Override the likelihood a distance must exceed for a bond order to be considered.
    #[arg(long, value_name = "FLOAT")]
    pub acceptance_threshold: Option<f64>,

    /// Override the highest bond order considered (1, 2 or 3).
    #[arg(long, value_name = "ORDER")]
    pub max_bond_order: Option<u8>,

    /// Fold the unbonded likelihood of candidate pairs left unbonded into the score.
    #[arg(long)]
    pub score_unbonded_pairs: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S inference.distance-cutoff=2.2
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}

/// Arguments for the `infer` subcommand.
#[derive(Args, Debug)]
pub struct InferArgs {
    /// Path to the input geometry file (multi-frame XYZ).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Print at most this many topologies per molecule.
    #[arg(short = 'n', long, value_name = "INT")]
    pub limit: Option<usize>,

    #[command(flatten)]
    pub inference: InferenceArgs,
}

/// Arguments for the `ingest` subcommand.
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Path to the input geometry file (multi-frame XYZ).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Store snapshot to write. Overrides `data.store` from the config file.
    #[arg(short, long, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Add to the existing snapshot instead of replacing it.
    #[arg(long)]
    pub append: bool,

    #[command(flatten)]
    pub inference: InferenceArgs,
}

/// Arguments for the `find-smiles` subcommand.
#[derive(Args, Debug)]
pub struct FindSmilesArgs {
    /// Fingerprints to look up; a molecule matches if any of them matches.
    #[arg(required = true, value_name = "FINGERPRINT")]
    pub fingerprints: Vec<String>,

    /// Store snapshot to query.
    #[arg(short, long, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Which stored topologies to match against: all, starting or best.
    #[arg(short, long, default_value = "all", value_name = "WHICH")]
    pub which: WhichTopologies,

    /// Path to the configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Arguments for the `find-topology` subcommand.
#[derive(Args, Debug)]
pub struct FindTopologyArgs {
    /// Fingerprint to scan for.
    #[arg(required = true, value_name = "FINGERPRINT")]
    pub fingerprint: String,

    /// Store snapshot to scan.
    #[arg(short, long, value_name = "PATH")]
    pub store: Option<PathBuf>,

    #[command(flatten)]
    pub inference: InferenceArgs,
}
