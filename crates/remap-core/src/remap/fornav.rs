//! Phase 2: resample each grid's bands, one backend call per group of bands
//! sharing a `remap_data_as` treatment.
//!
//! A failing group only drops its own bands. Losing every band is logged but
//! is not an error; callers check the result for emptiness.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::backend::{FornavRequest, RemapBackend};
use crate::error::{RemapError, Result};
use crate::io::fbf::FlatFileName;
use crate::job::{BandJobs, BandKey, CoordMapResult, GridJobSet};
use crate::pool::{TaskHandle, WorkerPool};

use super::config::RemapConfig;
use super::types::{ProgressReporter, RemapStage, ResampleGroup};

/// File name of a band's remapped output: depends only on the band's
/// identity, the grid name and the grid dimensions.
pub fn remapped_file_name(key: &BandKey, grid_name: &str, grid_width: usize, grid_height: usize) -> String {
    FlatFileName::real4(
        format!("result_{}{}_{}", key.band_kind, key.band_id, grid_name),
        grid_width,
        grid_height,
    )
    .to_string()
}

/// Partition a grid's bands into resampling groups, recording each band's
/// planned output path on the band itself.
fn plan_groups(
    grid_name: &str,
    bands: &mut BandJobs,
    ll2cr: &CoordMapResult,
    config: &RemapConfig,
) -> BTreeMap<String, ResampleGroup> {
    let mut groups: BTreeMap<String, ResampleGroup> = BTreeMap::new();
    for (key, band) in bands.iter_mut() {
        let output = config.work_dir.join(remapped_file_name(
            key,
            grid_name,
            ll2cr.grid.grid_width,
            ll2cr.grid.grid_height,
        ));
        band.remapped = Some(output.clone());
        groups
            .entry(band.remap_data_as.clone())
            .or_insert_with(|| ResampleGroup::new(band.remap_data_as.clone()))
            .push(key.clone(), band.swath_data.clone(), band.fill_value, output);
    }
    groups
}

fn fornav_request(
    nav_set: &str,
    grid_name: &str,
    group: &ResampleGroup,
    ll2cr: &CoordMapResult,
    config: &RemapConfig,
) -> FornavRequest {
    FornavRequest {
        swath_cols: ll2cr.swath_cols,
        swath_rows: ll2cr.swath_rows,
        swath_scans: ll2cr.scans_out,
        rows_per_scan: ll2cr.rows_per_scan,
        cols_filename: ll2cr.cols_filename.clone(),
        rows_filename: ll2cr.rows_filename.clone(),
        inputs: group.inputs().to_vec(),
        swath_fills: group.swath_fills().to_vec(),
        grid_width: ll2cr.grid.grid_width,
        grid_height: ll2cr.grid.grid_height,
        outputs: group.outputs().to_vec(),
        grid_fill: config.fill_value,
        weight_distance_max: config.weight_distance_max,
        weight_delta_max: config.weight_delta_max,
        start_scan: (ll2cr.scan_first, 0),
        verbose: config.verbose,
        tag: format!("fornav_{nav_set}_{grid_name}_{}", group.remap_data_as),
        work_dir: config.work_dir.clone(),
    }
}

struct PendingGroup {
    grid_name: String,
    group: ResampleGroup,
    handle: TaskHandle<Vec<PathBuf>>,
}

/// Run the resampling for every grid that survived coordinate mapping.
///
/// Grids without an entry in `ll2cr_output` are dropped.
pub fn run_fornav(
    nav_set: &str,
    grid_jobs: &GridJobSet,
    ll2cr_output: &BTreeMap<String, CoordMapResult>,
    backend: &Arc<dyn RemapBackend>,
    config: &RemapConfig,
    reporter: &Arc<dyn ProgressReporter>,
) -> Result<GridJobSet> {
    let mut pool = WorkerPool::new(config.num_procs)?;

    // Working copy; removals are applied here, never to `grid_jobs`.
    let mut fornav_output = GridJobSet::new();
    let mut pending: Vec<PendingGroup> = Vec::new();

    for (grid_name, bands) in grid_jobs {
        let Some(ll2cr) = ll2cr_output.get(grid_name) else {
            warn!(grid = %grid_name, "No ll2cr output for grid, skipping fornav");
            continue;
        };

        let mut planned = bands.clone();
        let groups = plan_groups(grid_name, &mut planned, ll2cr, config);
        fornav_output.insert(grid_name.clone(), planned);

        for (remap_data_as, group) in groups {
            info!(
                grid = %grid_name,
                remap_data_as = %remap_data_as,
                bands = group.len(),
                "Running fornav"
            );
            let request = fornav_request(nav_set, grid_name, &group, ll2cr, config);
            let task_backend = Arc::clone(backend);
            let label = format!("{grid_name}/{remap_data_as}");
            let task_label = label.clone();
            let handle = pool.submit(label, move || {
                task_backend.fornav(&request).map_err(|e| match e {
                    RemapError::Backend { .. } => e,
                    other => RemapError::backend(task_label, other.to_string()),
                })
            });
            pending.push(PendingGroup {
                grid_name: grid_name.clone(),
                group,
                handle,
            });
        }
    }

    reporter.begin_stage(RemapStage::Resampling, Some(pending.len()));
    pool.join();

    for (done, pending_group) in pending.into_iter().enumerate() {
        let PendingGroup {
            grid_name,
            group,
            handle,
        } = pending_group;
        let Some(bands) = fornav_output.get_mut(&grid_name) else {
            continue;
        };

        let result = handle.collect().and_then(|outputs| {
            if outputs.len() == group.len() {
                Ok(outputs)
            } else {
                Err(RemapError::backend(
                    format!("{grid_name}/{}", group.remap_data_as),
                    format!("expected {} outputs, got {}", group.len(), outputs.len()),
                ))
            }
        });

        match result {
            Ok(outputs) => {
                for (key, output) in group.bands().iter().zip(outputs) {
                    if let Some(band) = bands.get_mut(key) {
                        band.remapped = Some(output);
                    }
                }
                debug!(
                    grid = %grid_name,
                    remap_data_as = %group.remap_data_as,
                    "Fornav successfully completed"
                );
            }
            Err(e) => {
                warn!(
                    nav_set,
                    grid = %grid_name,
                    remap_data_as = %group.remap_data_as,
                    "fornav failed, cleaning up for this job"
                );
                debug!(error = %e, "fornav error");
                for key in group.bands() {
                    error!("Removing {}{} because of bad fornav execution", key.band_kind, key.band_id);
                    bands.remove(key);
                }
            }
        }
        reporter.advance(done + 1);
    }
    reporter.finish_stage();

    fornav_output.retain(|grid_name, bands| {
        if bands.is_empty() {
            error!(grid = %grid_name, "The last grid job for grid was removed");
            false
        } else {
            true
        }
    });

    if fornav_output.is_empty() {
        error!(
            nav_set,
            "Fornav was not able to complete any remapping for navigation set"
        );
    }

    Ok(fornav_output)
}
