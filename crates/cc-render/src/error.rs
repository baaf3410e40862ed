//! Error types for document rendering.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// The document could not be serialized.
    #[error("failed to pack document: {0}")]
    Pack(String),

    #[error("failed to read font map {path}: {source}")]
    FontMapRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid font map {path}: {source}")]
    FontMapParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, RenderError>;
