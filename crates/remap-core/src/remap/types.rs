use std::path::PathBuf;

use crate::io::ArrayRef;
use crate::job::BandKey;

/// Remap stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemapStage {
    CoordinateMapping,
    Resampling,
}

impl std::fmt::Display for RemapStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CoordinateMapping => write!(f, "Mapping coordinates"),
            Self::Resampling => write!(f, "Resampling"),
        }
    }
}

/// Thread-safe progress reporting for a remap run.
///
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A stage has started. `total_items` is the number of grid or group
    /// tasks whose results will be collected.
    fn begin_stage(&self, _stage: RemapStage, _total_items: Option<usize>) {}

    /// Results of `items_done` tasks have been collected.
    fn advance(&self, _items_done: usize) {}

    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `remap_bands` delegates.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// Swath longitude and latitude arrays shared by every grid of a run.
#[derive(Clone, Debug)]
pub struct SwathGeolocation {
    pub lon: ArrayRef,
    pub lat: ArrayRef,
}

/// Bands of one grid that share a `remap_data_as` treatment and are
/// resampled by a single backend call.
///
/// Inputs, fills and outputs stay positionally aligned with `bands`.
#[derive(Clone, Debug)]
pub struct ResampleGroup {
    pub remap_data_as: String,
    bands: Vec<BandKey>,
    inputs: Vec<ArrayRef>,
    swath_fills: Vec<f32>,
    outputs: Vec<PathBuf>,
}

impl ResampleGroup {
    pub fn new(remap_data_as: impl Into<String>) -> Self {
        Self {
            remap_data_as: remap_data_as.into(),
            bands: Vec::new(),
            inputs: Vec::new(),
            swath_fills: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn push(&mut self, band: BandKey, input: ArrayRef, swath_fill: f32, output: PathBuf) {
        self.bands.push(band);
        self.inputs.push(input);
        self.swath_fills.push(swath_fill);
        self.outputs.push(output);
    }

    pub fn bands(&self) -> &[BandKey] {
        &self.bands
    }

    pub fn inputs(&self) -> &[ArrayRef] {
        &self.inputs
    }

    pub fn swath_fills(&self) -> &[f32] {
        &self.swath_fills
    }

    pub fn outputs(&self) -> &[PathBuf] {
        &self.outputs
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}
