use std::f64::consts::FRAC_1_SQRT_2;
use std::path::{Path, PathBuf};

use ndarray::{Array2, Zip};
use rayon::prelude::*;
use tracing::debug;

use crate::consts::{
    DEFAULT_WEIGHT_DELTA_MAX, DEFAULT_WEIGHT_DISTANCE_MAX, LL2CR_FILL_OUT, PARALLEL_ROW_THRESHOLD,
    REAL4_TAG, WEIGHT_FALLOFF,
};
use crate::error::{RemapError, Result};
use crate::io::fbf::{self, FlatFileName};
use crate::projection::Projection;

use super::{CoordIndex, DescriptorLl2cr, FornavRequest, ProjectedLl2cr, RemapBackend};

/// Pure-Rust backend: projected coordinate mapping and weighted-navigation
/// resampling. Grid parameters files are not understood in-process.
pub struct InProcessBackend;

impl RemapBackend for InProcessBackend {
    fn name(&self) -> &str {
        "in-process"
    }

    fn ll2cr_projected(&self, request: &ProjectedLl2cr) -> Result<CoordIndex> {
        ll2cr_projected(request)
    }

    fn ll2cr_descriptor(&self, request: &DescriptorLl2cr) -> Result<CoordIndex> {
        Err(RemapError::backend(
            &request.tag,
            format!(
                "grid parameters file {} needs the ms2gt ll2cr executable",
                request.gpd_file.display()
            ),
        ))
    }

    fn fornav(&self, request: &FornavRequest) -> Result<Vec<PathBuf>> {
        fornav(request)
    }
}

/// Map every swath pixel to fractional grid column/row.
///
/// Column/row values are integral at cell centers; the grid origin is the
/// center of the upper-left cell. Unmappable pixels get `fill_out`.
pub(super) fn ll2cr_projected(request: &ProjectedLl2cr) -> Result<CoordIndex> {
    let projection = Projection::parse(&request.proj4_str)?;
    let lon = request.lon.load(request.swath_cols, request.swath_rows)?;
    let lat = request.lat.load(request.swath_cols, request.swath_rows)?;

    let shape = (request.swath_rows, request.swath_cols);
    let mut cols = Array2::<f32>::from_elem(shape, request.fill_out);
    let mut rows = Array2::<f32>::from_elem(shape, request.fill_out);

    let map_pixel = |c: &mut f32, r: &mut f32, &lo: &f32, &la: &f32| {
        if lo == request.fill_in || la == request.fill_in {
            return;
        }
        let (lo, la) = (lo as f64, la as f64);
        if !request.bounds.contains(lo, la) {
            return;
        }
        if let Some((x, y)) = projection.forward(lo, la) {
            *c = ((x - request.grid_origin_x) / request.pixel_size_x) as f32;
            *r = ((y - request.grid_origin_y) / request.pixel_size_y) as f32;
        }
    };

    let zip = Zip::from(&mut cols).and(&mut rows).and(&*lon).and(&*lat);
    if request.swath_rows >= PARALLEL_ROW_THRESHOLD {
        zip.par_for_each(map_pixel);
    } else {
        zip.for_each(map_pixel);
    }

    let in_grid = cols
        .iter()
        .zip(rows.iter())
        .filter(|&(&c, &r)| in_grid(c as f64, r as f64, request.grid_width, request.grid_height))
        .count();
    if in_grid == 0 {
        return Err(RemapError::backend(
            &request.tag,
            "no swath pixels fall inside the grid",
        ));
    }
    debug!(
        tag = %request.tag,
        in_grid,
        total = cols.len(),
        "Mapped swath pixels onto grid"
    );

    let cols_filename = request.work_dir.join(
        FlatFileName::real4(format!("{}_cols", request.tag), request.swath_cols, request.swath_rows)
            .to_string(),
    );
    let rows_filename = request.work_dir.join(
        FlatFileName::real4(format!("{}_rows", request.tag), request.swath_cols, request.swath_rows)
            .to_string(),
    );
    fbf::write_f32(&cols_filename, &cols)?;
    fbf::write_f32(&rows_filename, &rows)?;

    Ok(CoordIndex {
        cols_filename,
        rows_filename,
        scans: None,
    })
}

fn in_grid(col: f64, row: f64, width: usize, height: usize) -> bool {
    col >= -0.5 && col < width as f64 - 0.5 && row >= -0.5 && row < height as f64 - 0.5
}

fn is_mapped(col: f32, row: f32) -> bool {
    // ll2cr writes a large negative sentinel for unmapped pixels
    col.is_finite() && row.is_finite() && col > LL2CR_FILL_OUT / 2.0 && row > LL2CR_FILL_OUT / 2.0
}

/// Gaussian footprint of one swath pixel on the grid.
struct Footprint {
    radius: f64,
}

impl Footprint {
    fn new(weight_distance_max: Option<f64>, weight_delta_max: Option<f64>) -> Self {
        let distance = weight_distance_max.unwrap_or(DEFAULT_WEIGHT_DISTANCE_MAX);
        let delta = weight_delta_max.unwrap_or(DEFAULT_WEIGHT_DELTA_MAX);
        // At least one cell center is always within 1/sqrt(2) of a point
        // inside the grid.
        Self {
            radius: distance.min(delta).max(FRAC_1_SQRT_2),
        }
    }

    fn accumulate(
        &self,
        col: f64,
        row: f64,
        value: f64,
        sum: &mut Array2<f64>,
        weights: &mut Array2<f64>,
    ) {
        let (height, width) = sum.dim();
        let r2 = self.radius * self.radius;

        let i0 = (col - self.radius).ceil().max(0.0) as i64;
        let i1 = (col + self.radius).floor().min(width as f64 - 1.0) as i64;
        let j0 = (row - self.radius).ceil().max(0.0) as i64;
        let j1 = (row + self.radius).floor().min(height as f64 - 1.0) as i64;

        for j in j0..=j1 {
            for i in i0..=i1 {
                let d2 = (i as f64 - col).powi(2) + (j as f64 - row).powi(2);
                if d2 > r2 {
                    continue;
                }
                let w = (-WEIGHT_FALLOFF * d2 / r2).exp();
                let idx = [j as usize, i as usize];
                sum[idx] += w * value;
                weights[idx] += w;
            }
        }
    }
}

/// Weighted-navigation resampling of every channel in the request.
pub(super) fn fornav(request: &FornavRequest) -> Result<Vec<PathBuf>> {
    let count = request.inputs.len();
    if request.outputs.len() != count || request.swath_fills.len() != count {
        return Err(RemapError::InvalidJob(format!(
            "{}: {} inputs, {} fills, {} outputs",
            request.tag,
            count,
            request.swath_fills.len(),
            request.outputs.len()
        )));
    }

    let cols = read_index(&request.cols_filename, request)?;
    let rows = read_index(&request.rows_filename, request)?;
    if cols.dim() != rows.dim() {
        return Err(RemapError::backend(
            &request.tag,
            format!("cols index is {:?} but rows index is {:?}", cols.dim(), rows.dim()),
        ));
    }
    let footprint = Footprint::new(request.weight_distance_max, request.weight_delta_max);

    request
        .inputs
        .par_iter()
        .zip(&request.swath_fills)
        .zip(&request.outputs)
        .map(|((input, &swath_fill), output)| {
            let data = input.load(request.swath_cols, request.swath_rows)?;
            let grid = resample_channel(&data, swath_fill, &cols, &rows, &footprint, request);
            fbf::write_f32(output, &grid)?;
            debug!(tag = %request.tag, output = %output.display(), "Wrote remapped channel");
            Ok(output.clone())
        })
        .collect()
}

/// Read a cols/rows index file. The row count comes from the file name when
/// it has one; otherwise the index spans exactly the processed scans.
fn read_index(path: &Path, request: &FornavRequest) -> Result<Array2<f32>> {
    match FlatFileName::from_path(path) {
        Ok(name) if name.data_type == REAL4_TAG => {
            if name.cols != request.swath_cols {
                return Err(RemapError::backend(
                    &request.tag,
                    format!(
                        "{} has {} columns, swath has {}",
                        path.display(),
                        name.cols,
                        request.swath_cols
                    ),
                ));
            }
            fbf::read_f32(path, name.cols, name.rows)
        }
        _ => {
            let coord_rows = (request.start_scan.1 + request.swath_scans) * request.rows_per_scan;
            fbf::read_f32(path, request.swath_cols, coord_rows)
        }
    }
}

fn resample_channel(
    data: &Array2<f32>,
    swath_fill: f32,
    cols: &Array2<f32>,
    rows: &Array2<f32>,
    footprint: &Footprint,
    request: &FornavRequest,
) -> Array2<f32> {
    let shape = (request.grid_height, request.grid_width);
    let mut sum = Array2::<f64>::zeros(shape);
    let mut weights = Array2::<f64>::zeros(shape);
    let rps = request.rows_per_scan;

    for scan in 0..request.swath_scans {
        for k in 0..rps {
            let chan_row = (request.start_scan.0 + scan) * rps + k;
            let coord_row = (request.start_scan.1 + scan) * rps + k;
            if chan_row >= data.nrows() || coord_row >= cols.nrows() {
                break;
            }
            for c in 0..request.swath_cols {
                let value = data[[chan_row, c]];
                if !value.is_finite() || value == swath_fill {
                    continue;
                }
                let (col, row) = (cols[[coord_row, c]], rows[[coord_row, c]]);
                if !is_mapped(col, row) {
                    continue;
                }
                footprint.accumulate(col as f64, row as f64, value as f64, &mut sum, &mut weights);
            }
        }
    }

    Array2::from_shape_fn(shape, |idx| {
        let w = weights[idx];
        if w > 0.0 {
            (sum[idx] / w) as f32
        } else {
            request.grid_fill
        }
    })
}
