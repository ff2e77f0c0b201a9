use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_FILL_VALUE;
use crate::error::{RemapError, Result};

/// Which backend family runs the coordinate mapping and resampling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendPreference {
    /// Use the ms2gt executables when they can be found, else in-process.
    #[default]
    Auto,
    InProcess,
    Ms2gt,
}

impl fmt::Display for BackendPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "Auto"),
            Self::InProcess => write!(f, "In-process"),
            Self::Ms2gt => write!(f, "ms2gt"),
        }
    }
}

/// Locations of the ms2gt `ll2cr` and `fornav` executables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ms2gtConfig {
    pub ll2cr: PathBuf,
    pub fornav: PathBuf,
}

impl Default for Ms2gtConfig {
    fn default() -> Self {
        Self {
            ll2cr: PathBuf::from("ll2cr"),
            fornav: PathBuf::from("fornav"),
        }
    }
}

/// Optional geographic limits (degrees) used to pre-filter the swath.
/// A west limit greater than the east limit spans the antimeridian.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SwathBounds {
    pub lat_south: Option<f64>,
    pub lat_north: Option<f64>,
    pub lon_west: Option<f64>,
    pub lon_east: Option<f64>,
}

impl SwathBounds {
    pub fn is_unbounded(&self) -> bool {
        self.lat_south.is_none()
            && self.lat_north.is_none()
            && self.lon_west.is_none()
            && self.lon_east.is_none()
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        if self.lat_south.is_some_and(|s| lat < s) || self.lat_north.is_some_and(|n| lat > n) {
            return false;
        }
        match (self.lon_west, self.lon_east) {
            (Some(w), Some(e)) if w > e => lon >= w || lon <= e,
            (w, e) => !(w.is_some_and(|w| lon < w) || e.is_some_and(|e| lon > e)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemapConfig {
    /// Worker count for each phase; 1 runs everything inline.
    #[serde(default = "default_num_procs")]
    pub num_procs: usize,
    /// Swath input fill value; also the fill of remapped grids.
    #[serde(default = "default_fill_value")]
    pub fill_value: f32,
    /// Maximum weighting distance passed to the resampler (`-d`).
    #[serde(default)]
    pub weight_distance_max: Option<f64>,
    /// Maximum weighting extent passed to the resampler (`-D`).
    #[serde(default)]
    pub weight_delta_max: Option<f64>,
    /// Grid parameters definition file used in place of each
    /// descriptor-file grid's own. Projected grids are unaffected.
    #[serde(default)]
    pub forced_gpd: Option<PathBuf>,
    #[serde(default)]
    pub bounds: SwathBounds,
    /// Directory receiving coordinate-index and remapped files.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    /// Ask backends for verbose diagnostics.
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub backend: BackendPreference,
    #[serde(default)]
    pub ms2gt: Ms2gtConfig,
}

fn default_num_procs() -> usize {
    1
}

fn default_fill_value() -> f32 {
    DEFAULT_FILL_VALUE
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for RemapConfig {
    fn default() -> Self {
        Self {
            num_procs: default_num_procs(),
            fill_value: default_fill_value(),
            weight_distance_max: None,
            weight_delta_max: None,
            forced_gpd: None,
            bounds: SwathBounds::default(),
            work_dir: default_work_dir(),
            verbose: false,
            backend: BackendPreference::default(),
            ms2gt: Ms2gtConfig::default(),
        }
    }
}

impl RemapConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_procs == 0 {
            return Err(RemapError::InvalidConfig("num_procs must be at least 1".into()));
        }
        if let (Some(s), Some(n)) = (self.bounds.lat_south, self.bounds.lat_north) {
            if s > n {
                return Err(RemapError::InvalidConfig(format!(
                    "lat_south ({s}) is north of lat_north ({n})"
                )));
            }
        }
        for (name, value) in [
            ("weight_distance_max", self.weight_distance_max),
            ("weight_delta_max", self.weight_delta_max),
        ] {
            if value.is_some_and(|v| v.is_nan() || v <= 0.0) {
                return Err(RemapError::InvalidConfig(format!("{name} must be positive")));
            }
        }
        Ok(())
    }
}
