//! cif2stl: turn a CIF crystal structure into a printable STL model.
//!
//! ```bash
//! # 2x2x1 cells, spin on site 0, supports under the model
//! cif2stl Yb2Si2O7.cif --cells 2,2,1 --site-spin "0:[0,0,1]" --supports -v
//! ```

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};

use cif2stl::config::{Config, StlFormat};
use cif2stl::io::params::parse_triple;
use cif2stl::io::upload::UploadDir;
use cif2stl::physics::bonding::BondStrategy;
use cif2stl::pipeline::{generate, GenerationRequest};
use cif2stl::utils::logger;

/// Generate a 3D-printable STL model of a crystal structure.
#[derive(Parser)]
#[command(name = "cif2stl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input CIF file
    input: PathBuf,

    /// Output STL path (default: <input>.stl next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Unit cells along a,b,c; fractional counts give partial cells
    #[arg(long, value_parser = parse_triple, default_value = "1,1,1")]
    cells: [f64; 3],

    /// Rotation in degrees about x,y,z (applied x first)
    #[arg(long, value_parser = parse_triple, default_value = "0,0,0", allow_hyphen_values = true)]
    rotate: [f64; 3],

    /// Translation x,y,z
    #[arg(long, value_parser = parse_triple, default_value = "0,0,0", allow_hyphen_values = true)]
    translate: [f64; 3],

    /// Height of the base plane used by --supports
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    base_level: f64,

    /// Reduce to the primitive cell before expanding
    #[arg(long)]
    primitive: bool,

    /// Only draw these elements, e.g. "Yb,Si"
    #[arg(long, default_value = "")]
    targets: String,

    /// Spins by site index, e.g. "0:[0,0,1],3:[0,0,-1]"
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    site_spin: String,

    /// Spins by element, e.g. "Yb:[0,0,1]"
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    element_spin: String,

    /// Bond tolerance around each atom's nearest-neighbor distance
    #[arg(long)]
    tolerance: Option<f64>,

    /// Add a base slab and legs for printing
    #[arg(long)]
    supports: bool,

    /// Bond mode: graph, nearest or shells:N
    #[arg(long)]
    bonds: Option<BondStrategy>,

    /// Write ASCII STL instead of binary
    #[arg(long)]
    ascii: bool,

    /// Copy the input into this staging directory (cleared first) and work from there
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Config file to use instead of the per-user settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Store the config in use as the per-user settings
    #[arg(long)]
    save_config: bool,

    /// Output format for the result
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Suppress all non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Text,
    /// JSON report for scripting
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logger::init(logger::level_for_verbosity(cli.verbose, cli.quiet))
        .map_err(|e| anyhow!("failed to install logger: {}", e))?;

    let config = match &cli.config {
        Some(path) => Config::load_from(path).with_context(|| format!("loading {:?}", path))?,
        None => {
            let (config, msg) = Config::load();
            log::info!("{}", msg);
            config
        }
    };

    if cli.save_config {
        log::info!("{}", config.save());
    }

    let input = match &cli.upload_dir {
        Some(dir) => UploadDir::open(dir)?.stage(&cli.input)?,
        None => cli.input.clone(),
    };

    let request = GenerationRequest {
        input,
        output: cli.output.clone(),
        cells: cli.cells,
        rotation: cli.rotate,
        translation: cli.translate,
        base_level: cli.base_level,
        primitive: cli.primitive,
        targets: cli.targets.clone(),
        site_spins: cli.site_spin.clone(),
        element_spins: cli.element_spin.clone(),
        tolerance: cli.tolerance,
        supports: cli.supports,
        bonds: cli.bonds,
        format: cli.ascii.then_some(StlFormat::Ascii),
    };

    let report = generate(&request, &config).map_err(|e| anyhow!("{}: {}", e.kind(), e))?;

    if cli.quiet {
        return Ok(());
    }
    match cli.format {
        OutputFormat::Text => {
            print!("{}", report.summary);
            println!("Saved {}", report.output.display());
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
