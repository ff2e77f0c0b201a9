pub mod config;
mod fornav;
mod ll2cr;
mod orchestrator;
mod types;

pub use fornav::{remapped_file_name, run_fornav};
pub use ll2cr::{run_ll2cr, CoordMapTask, Ll2crOutput};
pub use orchestrator::{remap_bands, remap_bands_reported};
pub use types::{ProgressReporter, RemapStage, ResampleGroup, SwathGeolocation};
