use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use remap_core::backend::create_backend;
use remap_core::io::ArrayRef;
use remap_core::job::{read_job_set, write_job_set};
use remap_core::remap::config::{BackendPreference, RemapConfig};
use remap_core::remap::{remap_bands_reported, ProgressReporter, RemapStage, SwathGeolocation};
use tracing::warn;

use super::grids::load_catalog;
use crate::summary::{print_result_summary, print_run_summary};

#[derive(Clone, Copy, ValueEnum)]
pub enum BackendArg {
    Auto,
    InProcess,
    Ms2gt,
}

#[derive(Args)]
pub struct RunArgs {
    /// Band job set (JSON)
    #[arg(long)]
    pub jobs: PathBuf,

    /// Swath longitude file (`stem.real4.cols.rows`)
    #[arg(long)]
    pub lon: PathBuf,

    /// Swath latitude file (`stem.real4.cols.rows`)
    #[arg(long)]
    pub lat: PathBuf,

    /// Navigation set name, used in file tags and log messages
    #[arg(long, default_value = "swath")]
    pub nav_set: String,

    /// Remap config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Additional grid catalog (TOML `[[grid]]` tables)
    #[arg(long)]
    pub grids: Option<PathBuf>,

    /// Number of worker processes per phase
    #[arg(short = 'j', long)]
    pub num_procs: Option<usize>,

    /// Swath and grid fill value
    #[arg(long, allow_hyphen_values = true)]
    pub fill: Option<f32>,

    /// Maximum weighting distance for the resampler
    #[arg(long)]
    pub weight_distance_max: Option<f64>,

    /// Maximum weighting extent for the resampler
    #[arg(long)]
    pub weight_delta_max: Option<f64>,

    /// Grid parameters file used for every grid
    #[arg(long)]
    pub forced_gpd: Option<PathBuf>,

    /// Southern latitude limit of swath pixels to map
    #[arg(long, allow_hyphen_values = true)]
    pub lat_south: Option<f64>,

    /// Northern latitude limit of swath pixels to map
    #[arg(long, allow_hyphen_values = true)]
    pub lat_north: Option<f64>,

    /// Western longitude limit of swath pixels to map
    #[arg(long, allow_hyphen_values = true)]
    pub lon_west: Option<f64>,

    /// Eastern longitude limit of swath pixels to map
    #[arg(long, allow_hyphen_values = true)]
    pub lon_east: Option<f64>,

    /// Directory for intermediate and remapped files
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Backend used for coordinate mapping and resampling
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    /// Output job set (JSON)
    #[arg(short, long, default_value = "remapped.json")]
    pub output: PathBuf,
}

/// Drives an indicatif bar from remap progress callbacks.
struct BarReporter {
    bar: ProgressBar,
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: RemapStage, total_items: Option<usize>) {
        self.bar.set_length(total_items.unwrap_or(0) as u64);
        self.bar.set_position(0);
        self.bar.set_message(stage.to_string());
    }

    fn advance(&self, items_done: usize) {
        self.bar.set_position(items_done as u64);
    }
}

pub fn run(args: &RunArgs, verbose: bool) -> Result<()> {
    let config = build_config(args, verbose)?;
    let catalog = load_catalog(args.grids.as_ref())?;
    let jobs = read_job_set(&args.jobs)
        .with_context(|| format!("Failed to read job set {}", args.jobs.display()))?;
    let backend = create_backend(&config).context("Failed to set up remap backend")?;

    print_run_summary(&args.nav_set, &config, backend.name(), &jobs);

    let swath = SwathGeolocation {
        lon: ArrayRef::path(args.lon.clone()),
        lat: ArrayRef::path(args.lat.clone()),
    };

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:20} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    let reporter = Arc::new(BarReporter { bar: pb.clone() });

    let result = remap_bands_reported(
        &args.nav_set,
        &swath,
        &jobs,
        &catalog,
        backend,
        &config,
        reporter,
    );
    pb.finish_with_message("Done");
    let remapped =
        result.with_context(|| format!("Remapping failed for navigation set {}", args.nav_set))?;

    if remapped.is_empty() {
        warn!(nav_set = %args.nav_set, "No bands were remapped");
    }

    write_job_set(&args.output, &remapped)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    print_result_summary(&jobs, &remapped);
    println!("\nJob set saved to {}", args.output.display());

    Ok(())
}

fn build_config(args: &RunArgs, verbose: bool) -> Result<RemapConfig> {
    let mut config: RemapConfig = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid remap config")?
    } else {
        RemapConfig::default()
    };

    if let Some(n) = args.num_procs {
        config.num_procs = n;
    }
    if let Some(fill) = args.fill {
        config.fill_value = fill;
    }
    if args.weight_distance_max.is_some() {
        config.weight_distance_max = args.weight_distance_max;
    }
    if args.weight_delta_max.is_some() {
        config.weight_delta_max = args.weight_delta_max;
    }
    if args.forced_gpd.is_some() {
        config.forced_gpd = args.forced_gpd.clone();
    }
    if let Some(ref dir) = args.work_dir {
        config.work_dir = dir.clone();
    }
    if let Some(backend) = args.backend {
        config.backend = match backend {
            BackendArg::Auto => BackendPreference::Auto,
            BackendArg::InProcess => BackendPreference::InProcess,
            BackendArg::Ms2gt => BackendPreference::Ms2gt,
        };
    }

    let bounds = &mut config.bounds;
    for (slot, value) in [
        (&mut bounds.lat_south, args.lat_south),
        (&mut bounds.lat_north, args.lat_north),
        (&mut bounds.lon_west, args.lon_west),
        (&mut bounds.lon_east, args.lon_east),
    ] {
        if value.is_some() {
            *slot = value;
        }
    }

    config.verbose |= verbose;
    config.validate().context("Invalid remap config")?;
    Ok(config)
}
