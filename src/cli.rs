use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

use cartoprep::{DEFAULT_MIN_POLYGON_AREA, DEFAULT_TOOL_PATH};

/// Cartogram preparation CLI (argument schema only)
#[derive(Parser, Debug)]
#[command(name = "cartoprep", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Repair the input, then build tables, run the cartogram tool and clean up its output per scenario
    Run(RunArgs),

    /// Repair a GeoJSON file and drop tiny sub-polygons
    Repair(RepairArgs),

    /// Count invalid or self-intersecting features in GeoJSON files
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Input GeoJSON file
    #[arg(short, long, default_value = "data/us_state_1860_nspop_proj.geojson", value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "output", value_hint = ValueHint::DirPath)]
    pub output_dir: PathBuf,

    /// Cartogram binary
    #[arg(long, default_value = DEFAULT_TOOL_PATH, value_hint = ValueHint::ExecutablePath)]
    pub tool: PathBuf,

    /// Scenario file (TOML) replacing the built-in scenarios
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Which scenario(s) to run, in order (default: all)
    #[arg(long, alias = "years", num_args = 1..)]
    pub scenarios: Vec<String>,

    #[command(flatten)]
    pub repair: RepairFlags,

    /// Target number of points for the tool's simplify/densify (default: the tool's own)
    #[arg(short = 'P', long)]
    pub target_points: Option<u32>,

    /// Disable the tool's simplify/densify pass
    #[arg(long)]
    pub no_simplify: bool,

    /// Ask the tool to export its preprocessed input geometry
    #[arg(long)]
    pub export_preprocessed: bool,
}

#[derive(Args, Debug)]
pub struct RepairFlags {
    /// Minimum sub-polygon area to keep, in source projection units
    #[arg(long, default_value_t = DEFAULT_MIN_POLYGON_AREA)]
    pub min_area: f64,

    /// Skip geometry repair (use when input is already clean/simplified)
    #[arg(long)]
    pub skip_validation: bool,

    /// Keep every sub-polygon regardless of area
    #[arg(long)]
    pub no_discard: bool,
}

#[derive(Args, Debug)]
pub struct RepairArgs {
    /// Input GeoJSON file
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output file (default: `<input>_valid.geojson` beside the input)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub repair: RepairFlags,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// GeoJSON files to check
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    pub inputs: Vec<PathBuf>,
}
