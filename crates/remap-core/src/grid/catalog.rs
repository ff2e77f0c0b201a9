//! In-memory grid catalog, seeded with built-in grids and extendable from
//! TOML files of `[[grid]]` tables.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::consts::EARTH_RADIUS_M;
use crate::error::{RemapError, Result};

use super::{GridDescriptor, GridKind, GridLookup};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    grid: Vec<GridEntry>,
}

/// One `[[grid]]` table as written in a catalog file.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum GridEntry {
    Proj4 {
        name: String,
        proj4: String,
        width: usize,
        height: usize,
        pixel_size_x: f64,
        pixel_size_y: f64,
        origin_x: f64,
        origin_y: f64,
    },
    Gpd {
        name: String,
        gpd_file: PathBuf,
        width: usize,
        height: usize,
    },
}

impl GridEntry {
    fn into_descriptor(self, base_dir: Option<&Path>) -> Result<GridDescriptor> {
        let (name, kind, width, height) = match self {
            Self::Proj4 {
                name,
                proj4,
                width,
                height,
                pixel_size_x,
                pixel_size_y,
                origin_x,
                origin_y,
            } => {
                if pixel_size_x == 0.0 || pixel_size_y == 0.0 {
                    return Err(RemapError::InvalidGrid(format!(
                        "{name}: pixel sizes must be non-zero"
                    )));
                }
                let kind = GridKind::Proj4 {
                    proj4_str: proj4,
                    pixel_size_x,
                    pixel_size_y,
                    grid_origin_x: origin_x,
                    grid_origin_y: origin_y,
                };
                (name, kind, width, height)
            }
            Self::Gpd {
                name,
                gpd_file,
                width,
                height,
            } => {
                let gpd_filepath = match base_dir {
                    Some(dir) if gpd_file.is_relative() => dir.join(gpd_file),
                    _ => gpd_file,
                };
                (name, GridKind::Gpd { gpd_filepath }, width, height)
            }
        };

        if width == 0 || height == 0 {
            return Err(RemapError::InvalidGrid(format!(
                "{name}: width and height must be positive"
            )));
        }
        Ok(GridDescriptor {
            name,
            kind,
            grid_width: width,
            grid_height: height,
        })
    }
}

/// Grid catalog keyed by grid name.
#[derive(Clone, Debug, Default)]
pub struct GridCatalog {
    grids: BTreeMap<String, GridDescriptor>,
}

impl GridCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog holding the built-in global grids.
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();

        let latlon = "+proj=latlong +datum=WGS84 +no_defs";
        catalog.insert(GridDescriptor {
            name: "latlon_global_1deg".into(),
            kind: GridKind::Proj4 {
                proj4_str: latlon.into(),
                pixel_size_x: 1.0,
                pixel_size_y: -1.0,
                grid_origin_x: -179.5,
                grid_origin_y: 89.5,
            },
            grid_width: 360,
            grid_height: 180,
        });
        catalog.insert(GridDescriptor {
            name: "latlon_global_0p25deg".into(),
            kind: GridKind::Proj4 {
                proj4_str: latlon.into(),
                pixel_size_x: 0.25,
                pixel_size_y: -0.25,
                grid_origin_x: -179.875,
                grid_origin_y: 89.875,
            },
            grid_width: 1440,
            grid_height: 720,
        });

        let half_extent = std::f64::consts::PI * EARTH_RADIUS_M;
        catalog.insert(GridDescriptor {
            name: "merc_global_20km".into(),
            kind: GridKind::Proj4 {
                proj4_str: format!("+proj=merc +R={EARTH_RADIUS_M} +lon_0=0 +no_defs"),
                pixel_size_x: 20_000.0,
                pixel_size_y: -20_000.0,
                grid_origin_x: -half_extent + 10_000.0,
                grid_origin_y: half_extent - 10_000.0,
            },
            grid_width: 2004,
            grid_height: 2004,
        });

        catalog
    }

    /// Add or replace a grid.
    pub fn insert(&mut self, grid: GridDescriptor) {
        if self.grids.contains_key(&grid.name) {
            debug!(grid = %grid.name, "Replacing existing grid definition");
        }
        self.grids.insert(grid.name.clone(), grid);
    }

    /// Add the grids from a TOML catalog document. Relative `gpd_file` paths
    /// are resolved against `base_dir` when given.
    pub fn extend_from_toml(&mut self, contents: &str, base_dir: Option<&Path>) -> Result<usize> {
        let file: CatalogFile = toml::from_str(contents)?;
        let count = file.grid.len();
        for entry in file.grid {
            self.insert(entry.into_descriptor(base_dir)?);
        }
        Ok(count)
    }

    /// Built-in grids plus the grids defined in `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let mut catalog = Self::builtin();
        let count = catalog.extend_from_toml(&contents, path.parent())?;
        debug!(path = %path.display(), count, "Loaded grid catalog");
        Ok(catalog)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.grids.keys().map(String::as_str)
    }

    pub fn grids(&self) -> impl Iterator<Item = &GridDescriptor> {
        self.grids.values()
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}

impl GridLookup for GridCatalog {
    fn lookup(&self, grid_name: &str) -> Result<GridDescriptor> {
        self.grids
            .get(grid_name)
            .cloned()
            .ok_or_else(|| RemapError::UnknownGrid(grid_name.to_string()))
    }
}
