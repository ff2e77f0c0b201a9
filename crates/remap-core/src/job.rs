//! Band jobs and grid job sets, the plain mapping structures exchanged with
//! the caller and persisted as JSON.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{RemapError, Result};
use crate::grid::GridDescriptor;
use crate::io::ArrayRef;

/// `(band_kind, band_id)` identity of a band within one grid's job set.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BandKey {
    pub band_kind: String,
    pub band_id: String,
}

impl BandKey {
    pub fn new(band_kind: impl Into<String>, band_id: impl Into<String>) -> Self {
        Self {
            band_kind: band_kind.into(),
            band_id: band_id.into(),
        }
    }
}

impl fmt::Display for BandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.band_kind, self.band_id)
    }
}

impl FromStr for BandKey {
    type Err = RemapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((kind, id)) if !kind.is_empty() && !id.is_empty() => Ok(Self::new(kind, id)),
            _ => Err(RemapError::InvalidJob(format!(
                "band key '{s}' is not of the form 'kind:id'"
            ))),
        }
    }
}

impl Serialize for BandKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BandKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Coordinate mapping produced for one grid and shared by all its bands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoordMapResult {
    pub grid: GridDescriptor,
    pub swath_cols: usize,
    pub swath_rows: usize,
    pub rows_per_scan: usize,
    pub scans_out: usize,
    pub scan_first: usize,
    pub cols_filename: PathBuf,
    pub rows_filename: PathBuf,
}

/// One image band to remap onto one grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandJob {
    #[serde(rename = "fbf_swath")]
    pub swath_data: ArrayRef,
    pub swath_cols: usize,
    pub swath_rows: usize,
    pub rows_per_scan: usize,
    pub remap_data_as: String,
    pub fill_value: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ll2cr: Option<CoordMapResult>,
    #[serde(rename = "fbf_remapped", default, skip_serializing_if = "Option::is_none")]
    pub remapped: Option<PathBuf>,
    /// Caller fields carried through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl BandJob {
    pub fn new(
        swath_data: ArrayRef,
        swath_cols: usize,
        swath_rows: usize,
        rows_per_scan: usize,
        remap_data_as: impl Into<String>,
        fill_value: f32,
    ) -> Self {
        Self {
            swath_data,
            swath_cols,
            swath_rows,
            rows_per_scan,
            remap_data_as: remap_data_as.into(),
            fill_value,
            ll2cr: None,
            remapped: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.swath_cols == 0 || self.swath_rows == 0 {
            return Err(RemapError::InvalidJob(format!(
                "swath dimensions {}x{} must be positive",
                self.swath_cols, self.swath_rows
            )));
        }
        if self.rows_per_scan == 0 {
            return Err(RemapError::InvalidJob("rows_per_scan must be positive".into()));
        }
        if self.remap_data_as.is_empty() {
            return Err(RemapError::InvalidJob("remap_data_as must not be empty".into()));
        }
        Ok(())
    }
}

/// Bands belonging to one grid.
pub type BandJobs = BTreeMap<BandKey, BandJob>;

/// Grid identifier to the bands remapped onto it.
pub type GridJobSet = BTreeMap<String, BandJobs>;

/// Check every band of every grid.
pub fn validate_job_set(jobs: &GridJobSet) -> Result<()> {
    for (grid_name, bands) in jobs {
        for (key, band) in bands {
            band.validate()
                .map_err(|e| RemapError::InvalidJob(format!("grid {grid_name}, band {key}: {e}")))?;
        }
    }
    Ok(())
}

pub fn read_job_set(path: &Path) -> Result<GridJobSet> {
    let contents = fs::read_to_string(path)?;
    let jobs: GridJobSet = serde_json::from_str(&contents)?;
    validate_job_set(&jobs)?;
    Ok(jobs)
}

pub fn write_job_set(path: &Path, jobs: &GridJobSet) -> Result<()> {
    let contents = serde_json::to_string_pretty(jobs)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Band keys of one grid, in key order.
pub fn band_keys(bands: &BandJobs) -> Vec<BandKey> {
    bands.keys().cloned().collect()
}
