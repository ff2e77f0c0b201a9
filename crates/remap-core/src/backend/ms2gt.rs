//! Backend driving the ms2gt `ll2cr` and `fornav` executables.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{RemapError, Result};
use crate::remap::config::Ms2gtConfig;

use super::inprocess;
use super::{CoordIndex, DescriptorLl2cr, FornavRequest, ProjectedLl2cr, RemapBackend, ScanInfo};

pub struct Ms2gtBackend {
    ll2cr: PathBuf,
    fornav: PathBuf,
}

impl Ms2gtBackend {
    /// Resolve both executables; fails if either cannot be found.
    pub fn new(tools: Ms2gtConfig) -> Result<Self> {
        let ll2cr = resolve_tool(&tools.ll2cr)?.ok_or_else(|| missing_tool(&tools.ll2cr))?;
        let fornav = resolve_tool(&tools.fornav)?.ok_or_else(|| missing_tool(&tools.fornav))?;
        Ok(Self { ll2cr, fornav })
    }

    pub fn tools_available(tools: &Ms2gtConfig) -> bool {
        matches!(resolve_tool(&tools.ll2cr), Ok(Some(_)))
            && matches!(resolve_tool(&tools.fornav), Ok(Some(_)))
    }
}

impl RemapBackend for Ms2gtBackend {
    fn name(&self) -> &str {
        "ms2gt"
    }

    fn ll2cr_projected(&self, request: &ProjectedLl2cr) -> Result<CoordIndex> {
        // ms2gt's ll2cr only reads grid parameters files
        inprocess::ll2cr_projected(request)
    }

    fn ll2cr_descriptor(&self, request: &DescriptorLl2cr) -> Result<CoordIndex> {
        let work_dir = absolute(&request.work_dir)?;
        let lat = absolute(&request.lat.materialize(&work_dir, &format!("{}_lat", request.tag))?)?;
        let lon = absolute(&request.lon.materialize(&work_dir, &format!("{}_lon", request.tag))?)?;
        let gpd = absolute(&request.gpd_file)?;

        let args = ll2cr_args(request, &lat, &lon, &gpd);
        clear_coord_files(&work_dir, &request.tag)?;
        run_tool(&self.ll2cr, &args, &work_dir, &request.tag, request.verbose)?;
        find_coord_files(&work_dir, &request.tag)
    }

    fn fornav(&self, request: &FornavRequest) -> Result<Vec<PathBuf>> {
        let work_dir = absolute(&request.work_dir)?;
        let mut inputs = Vec::with_capacity(request.inputs.len());
        for (i, input) in request.inputs.iter().enumerate() {
            let path = input.materialize(&work_dir, &format!("{}_input{i}", request.tag))?;
            inputs.push(absolute(&path)?);
        }
        let outputs = request
            .outputs
            .iter()
            .map(|p| absolute(p))
            .collect::<Result<Vec<_>>>()?;

        let args = fornav_args(request, &inputs, &outputs)?;
        run_tool(&self.fornav, &args, &work_dir, &request.tag, request.verbose)?;

        for output in &outputs {
            if !output.is_file() {
                return Err(RemapError::backend(
                    &request.tag,
                    format!("fornav did not write {}", output.display()),
                ));
            }
        }
        Ok(request.outputs.clone())
    }
}

fn missing_tool(tool: &Path) -> RemapError {
    RemapError::InvalidConfig(format!("ms2gt executable '{}' not found", tool.display()))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

/// Bare names are looked up on `PATH`; anything with a directory part is
/// taken as given.
fn resolve_tool(tool: &Path) -> Result<Option<PathBuf>> {
    if tool.components().count() > 1 {
        return if tool.is_file() {
            absolute(tool).map(Some)
        } else {
            Ok(None)
        };
    }
    let Some(path) = env::var_os("PATH") else {
        return Ok(None);
    };
    Ok(env::split_paths(&path)
        .map(|dir| dir.join(tool))
        .find(|candidate| candidate.is_file()))
}

fn run_tool(program: &Path, args: &[String], work_dir: &Path, tag: &str, verbose: bool) -> Result<()> {
    debug!(program = %program.display(), ?args, "Running ms2gt tool");
    let output = Command::new(program)
        .args(args)
        .current_dir(work_dir)
        .output()
        .map_err(|e| RemapError::backend(tag, format!("failed to run {}: {e}", program.display())))?;

    if verbose {
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            debug!(tag, "{line}");
        }
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RemapError::backend(
            tag,
            format!("{} exited with {}: {}", program.display(), output.status, stderr.trim()),
        ));
    }
    Ok(())
}

fn ll2cr_args(request: &DescriptorLl2cr, lat: &Path, lon: &Path, gpd: &Path) -> Vec<String> {
    let mut args = Vec::new();
    if request.verbose {
        args.push("-v".to_string());
    }
    args.extend([
        "-f".to_string(),
        request.fill_in.to_string(),
        request.fill_out.to_string(),
        request.swath_cols.to_string(),
        request.swath_scans.to_string(),
        request.rows_per_scan.to_string(),
        lat.display().to_string(),
        lon.display().to_string(),
        gpd.display().to_string(),
        request.tag.clone(),
    ]);
    args
}

fn fornav_args(request: &FornavRequest, inputs: &[PathBuf], outputs: &[PathBuf]) -> Result<Vec<String>> {
    let count = inputs.len();
    if count == 0 || outputs.len() != count || request.swath_fills.len() != count {
        return Err(RemapError::InvalidJob(format!(
            "{}: {} inputs, {} fills, {} outputs",
            request.tag,
            count,
            request.swath_fills.len(),
            outputs.len()
        )));
    }

    let mut args = vec![count.to_string()];
    if request.verbose {
        args.push("-v".to_string());
    }
    args.push("-s".to_string());
    args.push(request.start_scan.0.to_string());
    args.push(request.start_scan.1.to_string());
    args.push("-t".to_string());
    args.extend(std::iter::repeat("f4".to_string()).take(count));
    args.push("-f".to_string());
    args.extend(request.swath_fills.iter().map(|f| f.to_string()));
    args.push("-F".to_string());
    args.extend(std::iter::repeat(request.grid_fill.to_string()).take(count));
    if let Some(d) = request.weight_distance_max {
        args.push("-d".to_string());
        args.push(d.to_string());
    }
    if let Some(delta) = request.weight_delta_max {
        args.push("-D".to_string());
        args.push(delta.to_string());
    }
    args.extend([
        request.swath_cols.to_string(),
        request.swath_scans.to_string(),
        request.rows_per_scan.to_string(),
        request.cols_filename.display().to_string(),
        request.rows_filename.display().to_string(),
    ]);
    args.extend(inputs.iter().map(|p| p.display().to_string()));
    args.push(request.grid_width.to_string());
    args.push(request.grid_height.to_string());
    args.extend(outputs.iter().map(|p| p.display().to_string()));
    Ok(args)
}

/// Remove index files left in `work_dir` by an earlier run with the same tag.
fn clear_coord_files(work_dir: &Path, tag: &str) -> Result<()> {
    let prefixes = [format!("{tag}_cols_"), format!("{tag}_rows_")];
    for entry in fs::read_dir(work_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if prefixes.iter().any(|p| name.starts_with(p.as_str())) && name.ends_with(".img") {
            debug!(tag, file = name, "Removing stale ll2cr output");
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// ll2cr names its outputs `{tag}_cols_{cols}_{first}_{scans}_{rps}.img`
/// (and `_rows_` likewise); the scan range is only reported there.
fn find_coord_files(work_dir: &Path, tag: &str) -> Result<CoordIndex> {
    let cols_prefix = format!("{tag}_cols_");
    let mut found = Vec::new();
    for entry in fs::read_dir(work_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(suffix) = name.to_str().and_then(|n| n.strip_prefix(&cols_prefix)) else {
            continue;
        };
        if let Some(scans) = parse_scan_suffix(suffix) {
            found.push((entry.path(), suffix.to_string(), scans));
        }
    }

    let (cols_filename, suffix, scans) = match found.len() {
        0 => return Err(RemapError::backend(tag, "ll2cr wrote no cols file")),
        1 => found.remove(0),
        n => {
            return Err(RemapError::backend(
                tag,
                format!("found {n} ll2cr cols files, expected one"),
            ))
        }
    };
    let rows_filename = work_dir.join(format!("{tag}_rows_{suffix}"));
    if !rows_filename.is_file() {
        return Err(RemapError::backend(
            tag,
            format!("ll2cr wrote no rows file {}", rows_filename.display()),
        ));
    }
    Ok(CoordIndex {
        cols_filename,
        rows_filename,
        scans: Some(scans),
    })
}

fn parse_scan_suffix(suffix: &str) -> Option<ScanInfo> {
    let fields: Vec<usize> = suffix
        .strip_suffix(".img")?
        .split('_')
        .map(|f| f.parse().ok())
        .collect::<Option<_>>()?;
    match fields.as_slice() {
        [_cols, scan_first, scans_out, _rows_per_scan] => Some(ScanInfo {
            scan_first: *scan_first,
            scans_out: *scans_out,
        }),
        _ => None,
    }
}
