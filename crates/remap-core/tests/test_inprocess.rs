//! End-to-end remapping with the in-process backend on a small lat/lon grid.

use std::path::Path;
use std::sync::Arc;

use approx::assert_relative_eq;
use ndarray::Array2;
use remap_core::backend::InProcessBackend;
use remap_core::error::RemapError;
use remap_core::grid::{GridCatalog, GridDescriptor, GridKind};
use remap_core::io::fbf::{read_named_f32, write_f32, FlatFileName};
use remap_core::io::ArrayRef;
use remap_core::job::{BandJob, BandJobs, BandKey, GridJobSet};
use remap_core::remap::config::RemapConfig;
use remap_core::remap::{remap_bands, SwathGeolocation};
use tempfile::tempdir;

const COLS: usize = 8;
const ROWS: usize = 4;
const RPS: usize = 2;
const FILL: f32 = -999.0;

/// 4x4 one-degree grid whose upper-left cell is centered on (0E, 3N).
fn small_grid(name: &str) -> GridDescriptor {
    GridDescriptor {
        name: name.into(),
        kind: GridKind::Proj4 {
            proj4_str: "+proj=latlong +datum=WGS84".into(),
            pixel_size_x: 1.0,
            pixel_size_y: -1.0,
            grid_origin_x: 0.0,
            grid_origin_y: 3.0,
        },
        grid_width: 4,
        grid_height: 4,
    }
}

fn catalog() -> GridCatalog {
    let mut catalog = GridCatalog::empty();
    catalog.insert(small_grid("small"));
    catalog.insert(GridDescriptor {
        name: "small_gpd".into(),
        kind: GridKind::Gpd {
            gpd_filepath: "/grids/small.gpd".into(),
        },
        grid_width: 4,
        grid_height: 4,
    });
    catalog
}

/// Swath pixel (r, c) sits at lon = c / 2, lat = 3 - r: two pixels per
/// grid column and one per grid row.
fn swath_lon_lat(rows: usize, lon_offset: f32) -> (Array2<f32>, Array2<f32>) {
    let lon = Array2::from_shape_fn((rows, COLS), |(_, c)| c as f32 * 0.5 + lon_offset);
    let lat = Array2::from_shape_fn((rows, COLS), |(r, _)| 3.0 - r as f32);
    (lon, lat)
}

fn write_swath(dir: &Path, stem: &str, data: &Array2<f32>) -> ArrayRef {
    let path = dir.join(FlatFileName::real4(stem, data.ncols(), data.nrows()).to_string());
    write_f32(&path, data).unwrap();
    ArrayRef::path(path)
}

fn geolocation_on_disk(dir: &Path, rows: usize, lon_offset: f32) -> SwathGeolocation {
    let (lon, lat) = swath_lon_lat(rows, lon_offset);
    SwathGeolocation {
        lon: write_swath(dir, "lon", &lon),
        lat: write_swath(dir, "lat", &lat),
    }
}

fn jobs_for(grid: &str, bands: Vec<(BandKey, ArrayRef)>) -> GridJobSet {
    jobs_with_rows(grid, ROWS, bands)
}

fn jobs_with_rows(grid: &str, rows: usize, bands: Vec<(BandKey, ArrayRef)>) -> GridJobSet {
    let bands: BandJobs = bands
        .into_iter()
        .map(|(key, data)| (key, BandJob::new(data, COLS, rows, RPS, "reflectances", FILL)))
        .collect();
    GridJobSet::from([(grid.to_string(), bands)])
}

fn config(work_dir: &Path, num_procs: usize) -> RemapConfig {
    RemapConfig {
        num_procs,
        work_dir: work_dir.to_path_buf(),
        ..Default::default()
    }
}

#[test]
fn test_constant_band_covers_grid() {
    let dir = tempdir().unwrap();
    let swath = geolocation_on_disk(dir.path(), ROWS, 0.0);
    let constant = write_swath(dir.path(), "ch01", &Array2::from_elem((ROWS, COLS), 10.0));
    let jobs = jobs_for("small", vec![(BandKey::new("ch", "01"), constant)]);

    let result = remap_bands(
        "nav",
        &swath,
        &jobs,
        &catalog(),
        Arc::new(InProcessBackend),
        &config(dir.path(), 1),
    )
    .unwrap();

    let band = &result["small"][&BandKey::new("ch", "01")];
    let output = band.remapped.clone().unwrap();
    assert_eq!(output, dir.path().join("result_ch01_small.real4.4.4"));

    let ll2cr = band.ll2cr.as_ref().unwrap();
    assert_eq!((ll2cr.scan_first, ll2cr.scans_out), (0, ROWS / RPS));
    assert!(ll2cr.cols_filename.exists());
    assert!(ll2cr.rows_filename.exists());

    let grid = read_named_f32(&output).unwrap();
    assert_eq!(grid.dim(), (4, 4));
    for &v in grid.iter() {
        assert_relative_eq!(v, 10.0, epsilon = 1e-5);
    }
}

#[test]
fn test_gradient_is_preserved_in_interior() {
    let dir = tempdir().unwrap();
    let swath = geolocation_on_disk(dir.path(), ROWS, 0.0);
    let (lon, _) = swath_lon_lat(ROWS, 0.0);
    let band = write_swath(dir.path(), "lon_band", &lon);
    let jobs = jobs_for("small", vec![(BandKey::new("lon", "00"), band)]);

    let result = remap_bands(
        "nav",
        &swath,
        &jobs,
        &catalog(),
        Arc::new(InProcessBackend),
        &config(dir.path(), 2),
    )
    .unwrap();

    let output = result["small"][&BandKey::new("lon", "00")].remapped.clone().unwrap();
    let grid = read_named_f32(&output).unwrap();
    for row in 0..4 {
        assert_relative_eq!(grid[[row, 1]], 1.0, epsilon = 1e-4);
        assert_relative_eq!(grid[[row, 2]], 2.0, epsilon = 1e-4);
    }
}

#[test]
fn test_in_memory_inputs() {
    let dir = tempdir().unwrap();
    let (lon, lat) = swath_lon_lat(ROWS, 0.0);
    let swath = SwathGeolocation {
        lon: ArrayRef::in_memory(lon),
        lat: ArrayRef::in_memory(lat),
    };
    let jobs = jobs_for(
        "small",
        vec![
            (BandKey::new("ch", "01"), ArrayRef::in_memory(Array2::from_elem((ROWS, COLS), 3.0))),
            (BandKey::new("ch", "02"), ArrayRef::in_memory(Array2::from_elem((ROWS, COLS), 7.0))),
        ],
    );

    let result = remap_bands(
        "nav",
        &swath,
        &jobs,
        &catalog(),
        Arc::new(InProcessBackend),
        &config(dir.path(), 2),
    )
    .unwrap();

    for (id, expected) in [("01", 3.0), ("02", 7.0)] {
        let output = result["small"][&BandKey::new("ch", id)].remapped.clone().unwrap();
        let grid = read_named_f32(&output).unwrap();
        assert!(grid.iter().all(|&v| (v - expected).abs() < 1e-5));
    }
}

#[test]
fn test_all_fill_band_yields_fill_grid() {
    let dir = tempdir().unwrap();
    let swath = geolocation_on_disk(dir.path(), ROWS, 0.0);
    let empty = write_swath(dir.path(), "ch09", &Array2::from_elem((ROWS, COLS), FILL));
    let jobs = jobs_for("small", vec![(BandKey::new("ch", "09"), empty)]);

    let result = remap_bands(
        "nav",
        &swath,
        &jobs,
        &catalog(),
        Arc::new(InProcessBackend),
        &config(dir.path(), 1),
    )
    .unwrap();

    let output = result["small"][&BandKey::new("ch", "09")].remapped.clone().unwrap();
    assert!(read_named_f32(&output).unwrap().iter().all(|&v| v == FILL));
}

#[test]
fn test_swath_outside_grid_fails_every_grid() {
    let dir = tempdir().unwrap();
    let swath = geolocation_on_disk(dir.path(), ROWS, 100.0);
    let band = write_swath(dir.path(), "ch01", &Array2::from_elem((ROWS, COLS), 1.0));
    let jobs = jobs_for("small", vec![(BandKey::new("ch", "01"), band)]);

    let err = remap_bands(
        "far_away",
        &swath,
        &jobs,
        &catalog(),
        Arc::new(InProcessBackend),
        &config(dir.path(), 1),
    )
    .unwrap_err();
    assert!(matches!(err, RemapError::AllGridsFailed { .. }));
}

#[test]
fn test_descriptor_grid_dropped_without_ms2gt() {
    let dir = tempdir().unwrap();
    let swath = geolocation_on_disk(dir.path(), ROWS, 0.0);
    let band = write_swath(dir.path(), "ch01", &Array2::from_elem((ROWS, COLS), 1.0));

    let mut jobs = jobs_for("small", vec![(BandKey::new("ch", "01"), band.clone())]);
    jobs.extend(jobs_for("small_gpd", vec![(BandKey::new("ch", "01"), band)]));

    let result = remap_bands(
        "nav",
        &swath,
        &jobs,
        &catalog(),
        Arc::new(InProcessBackend),
        &config(dir.path(), 2),
    )
    .unwrap();

    assert!(result.contains_key("small"));
    assert!(!result.contains_key("small_gpd"));
}

#[test]
fn test_partial_trailing_scan_still_resamples() {
    // 5 rows with 2 rows per scan: two whole scans and one spare row.
    let rows = 5;
    let dir = tempdir().unwrap();
    let swath = geolocation_on_disk(dir.path(), rows, 0.0);
    let band = write_swath(dir.path(), "ch01", &Array2::from_elem((rows, COLS), 10.0));
    let jobs = jobs_with_rows("small", rows, vec![(BandKey::new("ch", "01"), band)]);

    let result = remap_bands(
        "nav",
        &swath,
        &jobs,
        &catalog(),
        Arc::new(InProcessBackend),
        &config(dir.path(), 1),
    )
    .unwrap();

    let band = &result["small"][&BandKey::new("ch", "01")];
    let ll2cr = band.ll2cr.as_ref().unwrap();
    assert_eq!((ll2cr.scan_first, ll2cr.scans_out), (0, 2));

    let grid = read_named_f32(band.remapped.as_ref().unwrap()).unwrap();
    for &v in grid.iter() {
        assert_relative_eq!(v, 10.0, epsilon = 1e-5);
    }
}
