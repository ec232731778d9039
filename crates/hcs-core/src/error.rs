use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HcsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to load {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    #[error("Failed to persist level '{path}': {source}")]
    Persistence {
        path: String,
        #[source]
        source: Box<HcsError>,
    },

    #[error("Invalid store at {}: {reason}", path.display())]
    InvalidStore { path: PathBuf, reason: String },

    #[error("Chunk codec error: {0}")]
    Codec(String),

    #[error("Zarr error: {0}")]
    Zarr(String),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Manifest error: {0}")]
    Manifest(#[from] toml::de::Error),

    #[error("Executor error: {0}")]
    Executor(String),
}

impl HcsError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Load {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn zarr(err: impl std::fmt::Display) -> Self {
        Self::Zarr(err.to_string())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, HcsError>;
