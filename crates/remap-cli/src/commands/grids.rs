use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use remap_core::grid::{GridCatalog, GridKind};

#[derive(Args)]
pub struct GridsArgs {
    /// Additional grid catalog (TOML `[[grid]]` tables)
    #[arg(long)]
    pub grids: Option<PathBuf>,
}

pub fn run(args: &GridsArgs) -> Result<()> {
    let catalog = load_catalog(args.grids.as_ref())?;

    for grid in catalog.grids() {
        let detail = match &grid.kind {
            GridKind::Proj4 { proj4_str, .. } => proj4_str.clone(),
            GridKind::Gpd { gpd_filepath } => gpd_filepath.display().to_string(),
        };
        println!(
            "{:<28}{:<6}{:>6}x{:<6} {}",
            grid.name,
            grid.kind_name(),
            grid.grid_width,
            grid.grid_height,
            detail
        );
    }

    Ok(())
}

/// Built-in grids, plus those in `path` when given.
pub fn load_catalog(path: Option<&PathBuf>) -> Result<GridCatalog> {
    match path {
        Some(path) => GridCatalog::load(path)
            .with_context(|| format!("Failed to load grid catalog {}", path.display())),
        None => Ok(GridCatalog::builtin()),
    }
}
