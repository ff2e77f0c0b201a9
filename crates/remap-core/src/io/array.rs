use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::Array2;
use serde::de::{self, Deserializer, Visitor};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::{RemapError, Result};

use super::fbf::{self, FlatFileName};

/// Reference to a swath or grid array: either a flat binary file on disk or
/// an array already held in memory.
///
/// Only the on-disk form is serializable; job files always reference paths.
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayRef {
    Path(PathBuf),
    InMemory(Arc<Array2<f32>>),
}

impl ArrayRef {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn in_memory(data: Array2<f32>) -> Self {
        Self::InMemory(Arc::new(data))
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p),
            Self::InMemory(_) => None,
        }
    }

    /// Load the array, checking it has shape (rows, cols).
    pub fn load(&self, cols: usize, rows: usize) -> Result<Arc<Array2<f32>>> {
        match self {
            Self::Path(p) => Ok(Arc::new(fbf::read_f32(p, cols, rows)?)),
            Self::InMemory(data) => {
                if data.dim() != (rows, cols) {
                    return Err(RemapError::InvalidJob(format!(
                        "in-memory array is {}x{}, expected {}x{}",
                        data.ncols(),
                        data.nrows(),
                        cols,
                        rows
                    )));
                }
                Ok(Arc::clone(data))
            }
        }
    }

    /// Return a path to the array, writing in-memory data to `dir` as
    /// `{stem}.real4.{cols}.{rows}` first. External tools only read files.
    pub fn materialize(&self, dir: &Path, stem: &str) -> Result<PathBuf> {
        match self {
            Self::Path(p) => Ok(p.clone()),
            Self::InMemory(data) => {
                let name = FlatFileName::real4(stem, data.ncols(), data.nrows());
                let path = dir.join(name.to_string());
                fbf::write_f32(&path, data)?;
                Ok(path)
            }
        }
    }
}

impl From<PathBuf> for ArrayRef {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl fmt::Display for ArrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::InMemory(data) => write!(f, "<in-memory {}x{}>", data.ncols(), data.nrows()),
        }
    }
}

impl Serialize for ArrayRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Path(p) => p.serialize(serializer),
            Self::InMemory(_) => Err(ser::Error::custom(
                "in-memory arrays cannot be serialized; write them to a flat file first",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for ArrayRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PathVisitor;

        impl Visitor<'_> for PathVisitor {
            type Value = ArrayRef;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a flat binary file path")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<ArrayRef, E> {
                if v.is_empty() {
                    return Err(E::custom("empty array path"));
                }
                Ok(ArrayRef::Path(PathBuf::from(v)))
            }
        }

        deserializer.deserialize_str(PathVisitor)
    }
}
