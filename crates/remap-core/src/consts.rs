/// Fill value used when the caller does not provide one.
pub const DEFAULT_FILL_VALUE: f32 = -999.0;

/// Sentinel written to the cols/rows files for swath pixels that could not
/// be mapped onto the grid.
pub const LL2CR_FILL_OUT: f32 = -1e30;

/// Default maximum weighting distance (grid cells) for the in-process
/// resampler when none is configured.
pub const DEFAULT_WEIGHT_DISTANCE_MAX: f64 = 1.0;

/// Default cap on a swath pixel's footprint (grid cells) for the in-process
/// resampler.
pub const DEFAULT_WEIGHT_DELTA_MAX: f64 = 10.0;

/// Gaussian falloff at `weight_distance_max`: weights drop to exp(-2).
pub const WEIGHT_FALLOFF: f64 = 2.0;

/// Minimum swath row count to use row-level Rayon parallelism in-process.
pub const PARALLEL_ROW_THRESHOLD: usize = 64;

/// Data type tag used in flat binary file names for 32-bit floats.
pub const REAL4_TAG: &str = "real4";

/// Earth radius (meters) for spherical projections without `+R`/`+a`.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Mercator is undefined at the poles; clamp to this latitude (degrees).
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_6;
