//! Coordinate-mapping and resampling backends.
//!
//! The orchestrator only sees `RemapBackend`; which implementation runs is
//! decided once per run by `create_backend`.

mod inprocess;
mod ms2gt;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::io::ArrayRef;
use crate::remap::config::{BackendPreference, RemapConfig, SwathBounds};

pub use inprocess::InProcessBackend;
pub use ms2gt::Ms2gtBackend;

/// Coordinate mapping onto a closed-form projected grid.
#[derive(Clone, Debug)]
pub struct ProjectedLl2cr {
    pub lon: ArrayRef,
    pub lat: ArrayRef,
    pub swath_cols: usize,
    pub swath_rows: usize,
    pub proj4_str: String,
    pub pixel_size_x: f64,
    pub pixel_size_y: f64,
    pub grid_origin_x: f64,
    pub grid_origin_y: f64,
    pub grid_width: usize,
    pub grid_height: usize,
    pub fill_in: f32,
    pub fill_out: f32,
    pub bounds: SwathBounds,
    /// Prefix for the files this call produces.
    pub tag: String,
    pub work_dir: PathBuf,
}

/// Coordinate mapping onto a grid defined by a grid parameters file.
#[derive(Clone, Debug)]
pub struct DescriptorLl2cr {
    pub lon: ArrayRef,
    pub lat: ArrayRef,
    pub swath_cols: usize,
    pub swath_scans: usize,
    pub rows_per_scan: usize,
    pub gpd_file: PathBuf,
    pub fill_in: f32,
    pub fill_out: f32,
    pub verbose: bool,
    pub tag: String,
    pub work_dir: PathBuf,
}

/// Scan range of the swath covered by a coordinate mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanInfo {
    pub scan_first: usize,
    pub scans_out: usize,
}

/// Files written by a coordinate mapping.
#[derive(Clone, Debug, PartialEq)]
pub struct CoordIndex {
    pub cols_filename: PathBuf,
    pub rows_filename: PathBuf,
    /// Reported by backends that trim the swath to the scans touching the
    /// grid; `None` when the backend leaves that to the caller.
    pub scans: Option<ScanInfo>,
}

/// One resampling call covering every band of a resampling group.
#[derive(Clone, Debug)]
pub struct FornavRequest {
    pub swath_cols: usize,
    pub swath_rows: usize,
    pub swath_scans: usize,
    pub rows_per_scan: usize,
    pub cols_filename: PathBuf,
    pub rows_filename: PathBuf,
    pub inputs: Vec<ArrayRef>,
    pub swath_fills: Vec<f32>,
    pub grid_width: usize,
    pub grid_height: usize,
    pub outputs: Vec<PathBuf>,
    pub grid_fill: f32,
    pub weight_distance_max: Option<f64>,
    pub weight_delta_max: Option<f64>,
    /// (first channel scan, first cols/rows scan)
    pub start_scan: (usize, usize),
    pub verbose: bool,
    pub tag: String,
    pub work_dir: PathBuf,
}

pub trait RemapBackend: Send + Sync {
    fn name(&self) -> &str;

    fn ll2cr_projected(&self, request: &ProjectedLl2cr) -> Result<CoordIndex>;

    fn ll2cr_descriptor(&self, request: &DescriptorLl2cr) -> Result<CoordIndex>;

    /// Resample every input of the group. The returned paths are aligned
    /// with `request.outputs`.
    fn fornav(&self, request: &FornavRequest) -> Result<Vec<PathBuf>>;
}

/// Build the backend selected by the configuration.
pub fn create_backend(config: &RemapConfig) -> Result<Arc<dyn RemapBackend>> {
    let backend: Arc<dyn RemapBackend> = match config.backend {
        BackendPreference::InProcess => Arc::new(InProcessBackend),
        BackendPreference::Ms2gt => Arc::new(Ms2gtBackend::new(config.ms2gt.clone())?),
        BackendPreference::Auto => {
            if Ms2gtBackend::tools_available(&config.ms2gt) {
                Arc::new(Ms2gtBackend::new(config.ms2gt.clone())?)
            } else {
                Arc::new(InProcessBackend)
            }
        }
    };
    info!(backend = backend.name(), preference = %config.backend, "Selected remap backend");
    Ok(backend)
}
