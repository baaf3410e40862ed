//! Error types for conversion runs.
//!
//! Per-file problems never surface here; they are recorded in the run's
//! [`ConversionSummary`](cc_model::ConversionSummary). These errors abort
//! a whole input.

use std::path::PathBuf;

use cc_ingest::{IngestError, ParserError};
use cc_render::RenderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cartridge could not be opened or its manifest is unreadable.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// A standalone QTI file failed to parse.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParserError,
    },

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to serialize hierarchy: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no .imscc files found in {0}")]
    NoCartridges(PathBuf),
}

impl ConvertError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
