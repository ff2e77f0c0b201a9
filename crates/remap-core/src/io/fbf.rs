//! Flat binary files: headerless little-endian arrays whose element type and
//! shape are encoded in the file name as `{stem}.{type}.{cols}.{rows}`.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use memmap2::Mmap;
use ndarray::Array2;

use crate::consts::REAL4_TAG;
use crate::error::{RemapError, Result};

/// Parsed components of a flat binary file name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatFileName {
    pub stem: String,
    pub data_type: String,
    pub cols: usize,
    pub rows: usize,
}

impl FlatFileName {
    /// Name for a 32-bit float array.
    pub fn real4(stem: impl Into<String>, cols: usize, rows: usize) -> Self {
        Self {
            stem: stem.into(),
            data_type: REAL4_TAG.to_string(),
            cols,
            rows,
        }
    }

    /// Parse `stem.type.cols.rows`. The stem itself may contain dots.
    pub fn parse(name: &str) -> Result<Self> {
        let mut parts = name.rsplitn(4, '.');
        let rows = parts.next();
        let cols = parts.next();
        let data_type = parts.next();
        let stem = parts.next();
        match (stem, data_type, cols, rows) {
            (Some(stem), Some(data_type), Some(cols), Some(rows)) if !stem.is_empty() => {
                let cols = cols.parse().map_err(|_| {
                    RemapError::InvalidFlatFile(format!("{name}: bad column count '{cols}'"))
                })?;
                let rows = rows.parse().map_err(|_| {
                    RemapError::InvalidFlatFile(format!("{name}: bad row count '{rows}'"))
                })?;
                Ok(Self {
                    stem: stem.to_string(),
                    data_type: data_type.to_string(),
                    cols,
                    rows,
                })
            }
            _ => Err(RemapError::InvalidFlatFile(format!(
                "{name}: expected 'stem.type.cols.rows'"
            ))),
        }
    }

    /// Parse the file-name component of a path.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| RemapError::InvalidFlatFile(format!("{}", path.display())))?;
        Self::parse(name)
    }
}

impl fmt::Display for FlatFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.stem, self.data_type, self.cols, self.rows)
    }
}

/// Read a `cols` x `rows` little-endian f32 file into a (rows, cols) array.
pub fn read_f32(path: &Path, cols: usize, rows: usize) -> Result<Array2<f32>> {
    let expected = cols
        .checked_mul(rows)
        .and_then(|n| n.checked_mul(std::mem::size_of::<f32>()))
        .ok_or_else(|| {
            RemapError::InvalidFlatFile(format!("{}: dimensions overflow", path.display()))
        })?;

    let file = File::open(path)?;
    let actual = file.metadata()?.len() as usize;
    if actual != expected {
        return Err(RemapError::InvalidFlatFile(format!(
            "{}: expected {} bytes for {}x{} real4, found {}",
            path.display(),
            expected,
            cols,
            rows,
            actual
        )));
    }

    let mut values = vec![0f32; cols * rows];
    if expected > 0 {
        let mmap = unsafe { Mmap::map(&file)? };
        LittleEndian::read_f32_into(&mmap[..expected], &mut values);
    }

    Array2::from_shape_vec((rows, cols), values)
        .map_err(|e| RemapError::InvalidFlatFile(format!("{}: {e}", path.display())))
}

/// Read a file whose shape is taken from its name (`stem.real4.cols.rows`).
pub fn read_named_f32(path: &Path) -> Result<Array2<f32>> {
    let name = FlatFileName::from_path(path)?;
    if name.data_type != REAL4_TAG {
        return Err(RemapError::InvalidFlatFile(format!(
            "{}: unsupported data type '{}'",
            path.display(),
            name.data_type
        )));
    }
    read_f32(path, name.cols, name.rows)
}

/// Write a (rows, cols) array as little-endian f32, row-major.
pub fn write_f32(path: &Path, data: &Array2<f32>) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for &v in data.iter() {
        writer.write_f32::<LittleEndian>(v)?;
    }
    writer.flush()?;
    Ok(())
}
