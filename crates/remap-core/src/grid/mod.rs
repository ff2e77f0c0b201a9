pub mod catalog;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use catalog::GridCatalog;

/// How a grid's geometry is defined.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "grid_kind", rename_all = "snake_case")]
pub enum GridKind {
    /// Closed-form projection with an explicit cell size and origin.
    /// The origin is the projected coordinate of the upper-left cell's center.
    Proj4 {
        proj4_str: String,
        pixel_size_x: f64,
        pixel_size_y: f64,
        grid_origin_x: f64,
        grid_origin_y: f64,
    },
    /// Geometry held in an external grid parameters definition file.
    Gpd { gpd_filepath: PathBuf },
}

/// Immutable description of a target grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridDescriptor {
    pub name: String,
    #[serde(flatten)]
    pub kind: GridKind,
    pub grid_width: usize,
    pub grid_height: usize,
}

impl GridDescriptor {
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            GridKind::Proj4 { .. } => "proj4",
            GridKind::Gpd { .. } => "gpd",
        }
    }
}

/// Source of grid descriptors.
pub trait GridLookup: Send + Sync {
    /// Fails with `RemapError::UnknownGrid` when `grid_name` is not defined.
    fn lookup(&self, grid_name: &str) -> Result<GridDescriptor>;
}
