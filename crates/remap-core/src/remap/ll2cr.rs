//! Phase 1: map the swath onto each grid's column/row space.
//!
//! One task per grid. A failing grid is dropped whole, with all its bands;
//! the stage itself only fails when no grid survives.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::backend::{CoordIndex, DescriptorLl2cr, ProjectedLl2cr, RemapBackend, ScanInfo};
use crate::consts::LL2CR_FILL_OUT;
use crate::error::{RemapError, Result};
use crate::grid::{GridDescriptor, GridKind, GridLookup};
use crate::job::{band_keys, BandJob, BandKey, CoordMapResult, GridJobSet};
use crate::pool::{TaskHandle, WorkerPool};

use super::config::RemapConfig;
use super::types::{ProgressReporter, RemapStage, SwathGeolocation};

/// Surviving grids after Phase 1, each band carrying its grid's mapping.
#[derive(Clone, Debug)]
pub struct Ll2crOutput {
    pub grid_jobs: GridJobSet,
    pub results: BTreeMap<String, CoordMapResult>,
}

/// Coordinate-mapping call for one grid, resolved from the grid's kind.
#[derive(Clone, Debug)]
pub enum CoordMapTask {
    Projected(ProjectedLl2cr),
    Descriptor(DescriptorLl2cr),
}

impl CoordMapTask {
    /// Build the task for `grid` using the swath geometry of `representative`.
    pub fn for_grid(
        nav_set: &str,
        grid: &GridDescriptor,
        representative: &BandJob,
        swath: &SwathGeolocation,
        config: &RemapConfig,
    ) -> Self {
        let tag = format!("ll2cr_{nav_set}_{}", grid.name);
        let descriptor = |gpd_file| {
            Self::Descriptor(DescriptorLl2cr {
                lon: swath.lon.clone(),
                lat: swath.lat.clone(),
                swath_cols: representative.swath_cols,
                swath_scans: representative.swath_rows / representative.rows_per_scan,
                rows_per_scan: representative.rows_per_scan,
                gpd_file,
                fill_in: config.fill_value,
                fill_out: LL2CR_FILL_OUT,
                verbose: config.verbose,
                tag: tag.clone(),
                work_dir: config.work_dir.clone(),
            })
        };

        match &grid.kind {
            GridKind::Proj4 {
                proj4_str,
                pixel_size_x,
                pixel_size_y,
                grid_origin_x,
                grid_origin_y,
            } => Self::Projected(ProjectedLl2cr {
                lon: swath.lon.clone(),
                lat: swath.lat.clone(),
                swath_cols: representative.swath_cols,
                swath_rows: representative.swath_rows,
                proj4_str: proj4_str.clone(),
                pixel_size_x: *pixel_size_x,
                pixel_size_y: *pixel_size_y,
                grid_origin_x: *grid_origin_x,
                grid_origin_y: *grid_origin_y,
                grid_width: grid.grid_width,
                grid_height: grid.grid_height,
                fill_in: config.fill_value,
                fill_out: LL2CR_FILL_OUT,
                bounds: config.bounds.clone(),
                tag: tag.clone(),
                work_dir: config.work_dir.clone(),
            }),
            // A forced parameters file only replaces descriptor-file grids.
            GridKind::Gpd { gpd_filepath } => {
                descriptor(config.forced_gpd.clone().unwrap_or_else(|| gpd_filepath.clone()))
            }
        }
    }

    /// Scan bookkeeping the orchestrator must supply itself: projected
    /// mappers cover the whole swath and report none.
    pub fn synthesized_scans(&self, swath_rows: usize, rows_per_scan: usize) -> Option<ScanInfo> {
        match self {
            Self::Projected(_) => Some(ScanInfo {
                scan_first: 0,
                scans_out: swath_rows / rows_per_scan,
            }),
            Self::Descriptor(_) => None,
        }
    }

    /// Run on `backend`, attributing any failure to `grid_name`.
    pub fn run(&self, backend: &dyn RemapBackend, grid_name: &str) -> Result<CoordIndex> {
        let result = match self {
            Self::Projected(request) => backend.ll2cr_projected(request),
            Self::Descriptor(request) => backend.ll2cr_descriptor(request),
        };
        result.map_err(|e| match e {
            RemapError::Backend { .. } => e,
            other => RemapError::backend(grid_name, other.to_string()),
        })
    }
}

/// A grid whose task has been submitted, waiting for collection.
struct PendingGrid {
    grid: GridDescriptor,
    swath_cols: usize,
    swath_rows: usize,
    rows_per_scan: usize,
    synthesized: Option<ScanInfo>,
}

impl PendingGrid {
    fn merge(self, index: CoordIndex) -> Result<CoordMapResult> {
        let scans = index.scans.or(self.synthesized).ok_or_else(|| {
            RemapError::backend(&self.grid.name, "backend reported no scan bookkeeping")
        })?;
        Ok(CoordMapResult {
            grid: self.grid,
            swath_cols: self.swath_cols,
            swath_rows: self.swath_rows,
            rows_per_scan: self.rows_per_scan,
            scans_out: scans.scans_out,
            scan_first: scans.scan_first,
            cols_filename: index.cols_filename,
            rows_filename: index.rows_filename,
        })
    }
}

fn log_removed_grid(grid_name: &str, keys: &[BandKey], err: &RemapError) {
    warn!(grid = grid_name, bands = ?keys, "ll2cr failed for grid, won't process for this grid");
    debug!(grid = grid_name, error = %err, "ll2cr error");
    for key in keys {
        error!(
            "Removing processing for kind {} band {} because of bad ll2cr execution on grid {}",
            key.band_kind, key.band_id, grid_name
        );
    }
}

/// Run the coordinate mapping for every grid in `grid_jobs`.
///
/// Fails with `RemapError::AllGridsFailed` if no grid could be mapped.
pub fn run_ll2cr(
    nav_set: &str,
    swath: &SwathGeolocation,
    grid_jobs: &GridJobSet,
    catalog: &dyn GridLookup,
    backend: &Arc<dyn RemapBackend>,
    config: &RemapConfig,
    reporter: &Arc<dyn ProgressReporter>,
) -> Result<Ll2crOutput> {
    let mut pool = WorkerPool::new(config.num_procs)?;
    reporter.begin_stage(RemapStage::CoordinateMapping, Some(grid_jobs.len()));

    let mut pending: Vec<(String, PendingGrid, TaskHandle<CoordIndex>)> =
        Vec::with_capacity(grid_jobs.len());
    let mut failed: Vec<(String, RemapError)> = Vec::new();

    for (grid_name, bands) in grid_jobs {
        info!(
            grid = %grid_name,
            bands = ?band_keys(bands),
            "Running ll2cr for grid"
        );

        let grid = match catalog.lookup(grid_name) {
            Ok(grid) => grid,
            Err(e) => {
                failed.push((grid_name.clone(), e));
                continue;
            }
        };
        // All bands of a grid share the swath geometry; any one will do.
        let Some(representative) = bands.values().next() else {
            failed.push((
                grid_name.clone(),
                RemapError::InvalidJob(format!("grid {grid_name} has no bands")),
            ));
            continue;
        };

        let task = CoordMapTask::for_grid(nav_set, &grid, representative, swath, config);
        let synthesized =
            task.synthesized_scans(representative.swath_rows, representative.rows_per_scan);
        let task_backend = Arc::clone(backend);
        let task_grid = grid_name.clone();
        let handle = pool.submit(grid_name.clone(), move || {
            task.run(task_backend.as_ref(), &task_grid)
        });

        pending.push((
            grid_name.clone(),
            PendingGrid {
                grid,
                swath_cols: representative.swath_cols,
                swath_rows: representative.swath_rows,
                rows_per_scan: representative.rows_per_scan,
                synthesized,
            },
            handle,
        ));
    }

    pool.join();

    let mut output = Ll2crOutput {
        grid_jobs: GridJobSet::new(),
        results: BTreeMap::new(),
    };
    let mut collected = 0;

    for (grid_name, err) in &failed {
        log_removed_grid(grid_name, &band_keys(&grid_jobs[grid_name]), err);
        collected += 1;
        reporter.advance(collected);
    }

    for (grid_name, grid, handle) in pending {
        let bands = &grid_jobs[&grid_name];
        match handle.collect().and_then(|index| grid.merge(index)) {
            Ok(result) => {
                debug!(
                    grid = %grid_name,
                    scans_out = result.scans_out,
                    scan_first = result.scan_first,
                    "ll2cr completed"
                );
                let mapped = bands
                    .iter()
                    .map(|(key, band)| {
                        let mut band = band.clone();
                        band.ll2cr = Some(result.clone());
                        (key.clone(), band)
                    })
                    .collect();
                output.grid_jobs.insert(grid_name.clone(), mapped);
                output.results.insert(grid_name, result);
            }
            Err(e) => log_removed_grid(&grid_name, &band_keys(bands), &e),
        }
        collected += 1;
        reporter.advance(collected);
    }
    reporter.finish_stage();

    if output.grid_jobs.is_empty() {
        error!(nav_set, "All grids failed during ll2cr processing");
        return Err(RemapError::AllGridsFailed {
            nav_set: nav_set.to_string(),
        });
    }

    Ok(output)
}
