use std::fs;
use std::sync::Arc;

use tracing::info;

use crate::backend::RemapBackend;
use crate::error::Result;
use crate::grid::GridLookup;
use crate::job::{validate_job_set, GridJobSet};

use super::config::RemapConfig;
use super::fornav::run_fornav;
use super::ll2cr::run_ll2cr;
use super::types::{NoOpReporter, ProgressReporter, SwathGeolocation};

/// Remap every band of `grid_jobs` with a thread-safe progress reporter.
///
/// Returns the surviving grids and bands with `remapped` populated. Errors
/// only when the job set or configuration is invalid, or when coordinate
/// mapping failed for every grid; a run where every resampling group failed
/// returns an empty job set.
pub fn remap_bands_reported(
    nav_set: &str,
    swath: &SwathGeolocation,
    grid_jobs: &GridJobSet,
    catalog: &dyn GridLookup,
    backend: Arc<dyn RemapBackend>,
    config: &RemapConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<GridJobSet> {
    config.validate()?;
    validate_job_set(grid_jobs)?;
    fs::create_dir_all(&config.work_dir)?;

    info!(
        nav_set,
        grids = grid_jobs.len(),
        backend = backend.name(),
        num_procs = config.num_procs,
        "Remapping bands"
    );

    let ll2cr = run_ll2cr(nav_set, swath, grid_jobs, catalog, &backend, config, &reporter)?;
    let remapped = run_fornav(
        nav_set,
        &ll2cr.grid_jobs,
        &ll2cr.results,
        &backend,
        config,
        &reporter,
    )?;

    info!(
        nav_set,
        grids = remapped.len(),
        bands = remapped.values().map(|b| b.len()).sum::<usize>(),
        "Remapping complete"
    );
    Ok(remapped)
}

/// Remap every band of `grid_jobs`.
pub fn remap_bands(
    nav_set: &str,
    swath: &SwathGeolocation,
    grid_jobs: &GridJobSet,
    catalog: &dyn GridLookup,
    backend: Arc<dyn RemapBackend>,
    config: &RemapConfig,
) -> Result<GridJobSet> {
    let reporter = Arc::new(NoOpReporter);
    remap_bands_reported(nav_set, swath, grid_jobs, catalog, backend, config, reporter)
}
