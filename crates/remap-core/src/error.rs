use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown grid: {0}")]
    UnknownGrid(String),

    #[error("Backend failure for {target}: {message}")]
    Backend { target: String, message: String },

    #[error("All grids failed during ll2cr processing for {nav_set}")]
    AllGridsFailed { nav_set: String },

    #[error("Invalid band job: {0}")]
    InvalidJob(String),

    #[error("Invalid grid definition: {0}")]
    InvalidGrid(String),

    #[error("Unsupported projection: {0}")]
    UnsupportedProjection(String),

    #[error("Invalid flat binary file: {0}")]
    InvalidFlatFile(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl RemapError {
    /// Backend error scoped to a grid or a resampling group.
    pub fn backend(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            target: target.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RemapError>;
