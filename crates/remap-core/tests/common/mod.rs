#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use remap_core::backend::{
    CoordIndex, DescriptorLl2cr, FornavRequest, ProjectedLl2cr, RemapBackend, ScanInfo,
};
use remap_core::error::{RemapError, Result};
use remap_core::grid::{GridCatalog, GridDescriptor, GridKind};
use remap_core::io::ArrayRef;
use remap_core::job::{BandJob, BandJobs, BandKey, GridJobSet};
use remap_core::remap::config::RemapConfig;
use remap_core::remap::SwathGeolocation;

pub const NAV_SET: &str = "test_nav";
pub const SWATH_COLS: usize = 20;
pub const SWATH_ROWS: usize = 32;
pub const ROWS_PER_SCAN: usize = 16;

/// Deterministic backend that writes nothing and fails on request.
#[derive(Default)]
pub struct MockBackend {
    failing_grids: HashSet<String>,
    panicking_grids: HashSet<String>,
    failing_groups: HashSet<String>,
    pub projected_calls: AtomicUsize,
    pub descriptor_calls: AtomicUsize,
    pub fornav_calls: AtomicUsize,
    /// Parameters files seen by descriptor-file mapping calls.
    pub gpd_files: Mutex<Vec<PathBuf>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_grid(mut self, grid: &str) -> Self {
        self.failing_grids.insert(ll2cr_tag(grid));
        self
    }

    pub fn panic_grid(mut self, grid: &str) -> Self {
        self.panicking_grids.insert(ll2cr_tag(grid));
        self
    }

    pub fn fail_group(mut self, grid: &str, remap_data_as: &str) -> Self {
        self.failing_groups
            .insert(format!("fornav_{NAV_SET}_{grid}_{remap_data_as}"));
        self
    }

    pub fn ll2cr_calls(&self) -> usize {
        self.projected_calls.load(Ordering::SeqCst) + self.descriptor_calls.load(Ordering::SeqCst)
    }

    pub fn fornav_calls(&self) -> usize {
        self.fornav_calls.load(Ordering::SeqCst)
    }

    fn check_grid(&self, tag: &str) -> Result<()> {
        // Vary completion order between tasks without randomness.
        std::thread::sleep(Duration::from_millis((tag.len() % 4) as u64));
        if self.panicking_grids.contains(tag) {
            panic!("mock ll2cr crashed for {tag}");
        }
        if self.failing_grids.contains(tag) {
            return Err(RemapError::backend(tag, "mock ll2cr failure"));
        }
        Ok(())
    }

    fn index(tag: &str, work_dir: &Path) -> (PathBuf, PathBuf) {
        (
            work_dir.join(format!("{tag}_cols.real4.{SWATH_COLS}.{SWATH_ROWS}")),
            work_dir.join(format!("{tag}_rows.real4.{SWATH_COLS}.{SWATH_ROWS}")),
        )
    }
}

impl RemapBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn ll2cr_projected(&self, request: &ProjectedLl2cr) -> Result<CoordIndex> {
        self.projected_calls.fetch_add(1, Ordering::SeqCst);
        self.check_grid(&request.tag)?;
        let (cols_filename, rows_filename) = Self::index(&request.tag, &request.work_dir);
        Ok(CoordIndex {
            cols_filename,
            rows_filename,
            scans: None,
        })
    }

    fn ll2cr_descriptor(&self, request: &DescriptorLl2cr) -> Result<CoordIndex> {
        self.descriptor_calls.fetch_add(1, Ordering::SeqCst);
        self.gpd_files.lock().unwrap().push(request.gpd_file.clone());
        self.check_grid(&request.tag)?;
        let (cols_filename, rows_filename) = Self::index(&request.tag, &request.work_dir);
        Ok(CoordIndex {
            cols_filename,
            rows_filename,
            scans: Some(ScanInfo {
                scan_first: 1,
                scans_out: request.swath_scans - 1,
            }),
        })
    }

    fn fornav(&self, request: &FornavRequest) -> Result<Vec<PathBuf>> {
        self.fornav_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(request.inputs.len(), request.outputs.len());
        assert_eq!(request.inputs.len(), request.swath_fills.len());
        std::thread::sleep(Duration::from_millis((request.tag.len() % 3) as u64));
        if self.failing_groups.contains(&request.tag) {
            return Err(RemapError::backend(&request.tag, "mock fornav failure"));
        }
        Ok(request.outputs.clone())
    }
}

pub fn ll2cr_tag(grid: &str) -> String {
    format!("ll2cr_{NAV_SET}_{grid}")
}

pub fn proj4_grid(name: &str, width: usize, height: usize) -> GridDescriptor {
    GridDescriptor {
        name: name.into(),
        kind: GridKind::Proj4 {
            proj4_str: "+proj=latlong +datum=WGS84".into(),
            pixel_size_x: 0.5,
            pixel_size_y: -0.5,
            grid_origin_x: -10.0,
            grid_origin_y: 10.0,
        },
        grid_width: width,
        grid_height: height,
    }
}

pub fn gpd_grid(name: &str, width: usize, height: usize) -> GridDescriptor {
    GridDescriptor {
        name: name.into(),
        kind: GridKind::Gpd {
            gpd_filepath: PathBuf::from(format!("/grids/{name}.gpd")),
        },
        grid_width: width,
        grid_height: height,
    }
}

/// `grid_a`, `grid_b`, `grid_c` (projected) and `grid_gpd` (descriptor file).
pub fn test_catalog() -> GridCatalog {
    let mut catalog = GridCatalog::empty();
    catalog.insert(proj4_grid("grid_a", 40, 40));
    catalog.insert(proj4_grid("grid_b", 80, 60));
    catalog.insert(proj4_grid("grid_c", 30, 30));
    catalog.insert(gpd_grid("grid_gpd", 50, 50));
    catalog
}

pub fn band(remap_data_as: &str, kind: &str, id: &str) -> BandJob {
    BandJob::new(
        ArrayRef::path(format!("swath_{kind}{id}.real4.{SWATH_COLS}.{SWATH_ROWS}")),
        SWATH_COLS,
        SWATH_ROWS,
        ROWS_PER_SCAN,
        remap_data_as,
        -999.0,
    )
}

/// Job set from `(grid, [(band_kind, band_id, remap_data_as)])`.
pub fn job_set(layout: Vec<(&str, Vec<(&str, &str, &str)>)>) -> GridJobSet {
    layout.into_iter()
        .map(|(grid, bands)| {
            let bands: BandJobs = bands
                .into_iter()
                .map(|(kind, id, rda)| (BandKey::new(kind, id), band(rda, kind, id)))
                .collect();
            (grid.to_string(), bands)
        })
        .collect()
}

/// Three grids, two resampling groups in `grid_a`.
pub fn standard_jobs() -> GridJobSet {
    job_set(vec![
        (
            "grid_a",
            vec![
                ("i", "01", "reflectances"),
                ("i", "02", "reflectances"),
                ("i", "05", "btemp"),
            ],
        ),
        ("grid_b", vec![("m", "07", "reflectances"), ("m", "15", "btemp")]),
        ("grid_gpd", vec![("dnb", "00", "radiances")]),
    ])
}

pub fn geolocation() -> SwathGeolocation {
    SwathGeolocation {
        lon: ArrayRef::path(format!("lon.real4.{SWATH_COLS}.{SWATH_ROWS}")),
        lat: ArrayRef::path(format!("lat.real4.{SWATH_COLS}.{SWATH_ROWS}")),
    }
}

pub fn config_in(work_dir: &Path, num_procs: usize) -> RemapConfig {
    RemapConfig {
        num_procs,
        work_dir: work_dir.to_path_buf(),
        ..Default::default()
    }
}

/// Grid and band keys of a job set, for shape comparisons.
pub fn keys(jobs: &GridJobSet) -> Vec<(String, Vec<BandKey>)> {
    jobs.iter()
        .map(|(grid, bands)| (grid.clone(), bands.keys().cloned().collect()))
        .collect()
}
