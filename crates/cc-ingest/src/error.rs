//! Error types for cartridge ingestion.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading an XML document.
#[derive(Debug, Error)]
pub enum ParserError {
    /// The document is not well-formed.
    #[error("malformed XML at byte {position}: {message}")]
    Xml { position: u64, message: String },

    /// Text could not be decoded to UTF-8.
    #[error("invalid text encoding at byte {position}: {message}")]
    Encoding { position: u64, message: String },

    /// The document has no root element.
    #[error("document has no root element")]
    EmptyDocument,

    /// The root element is not `<questestinterop>`.
    #[error("not a QTI assessment (root element is <{root}>)")]
    NotAssessment { root: String },

    /// A QTI question bank (`<objectbank>`), which holds no assessment.
    #[error("question bank {ident:?} holds no assessment")]
    QuestionBank { ident: String },

    /// A structurally required element is missing.
    #[error("missing <{element}> in {context}")]
    MissingElement {
        element: &'static str,
        context: String,
    },
}

impl ParserError {
    pub(crate) fn missing(element: &'static str, context: impl Into<String>) -> Self {
        Self::MissingElement {
            element,
            context: context.into(),
        }
    }
}

/// Errors raised while opening or reading a cartridge archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid zip archive {label}: {source}")]
    Zip {
        label: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("failed to read {name} from archive: {message}")]
    Entry { name: String, message: String },

    /// Every cartridge carries `imsmanifest.xml` at its root.
    #[error("{label} has no imsmanifest.xml")]
    MissingManifest { label: String },

    #[error("archive lock poisoned")]
    Poisoned,
}

/// Failure to open a cartridge: either the archive or its manifest.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("invalid manifest: {0}")]
    Manifest(#[from] ParserError),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
