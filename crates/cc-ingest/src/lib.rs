//! Reading Common Cartridge packages.
//!
//! This crate handles:
//! - Opening `.imscc` archives and reading entries by name
//! - Extracting the manifest's resource registry and organization tree
//! - Parsing QTI 1.2 assessments, including styled HTML question text

pub mod archive;
pub mod discovery;
pub mod error;
pub mod manifest;
pub mod qti;
pub mod xml;

use std::path::Path;

pub use archive::{ArchiveEntry, CartridgeArchive, MANIFEST_NAME};
pub use discovery::collect_assessments;
pub use error::{ArchiveError, IngestError, ParserError, Result};
pub use manifest::{Manifest, SYNTHETIC_ROOT_ID, parse_manifest};
pub use qti::{classify_profile, parse_assessment, parse_html_content};

/// An opened archive together with its parsed manifest.
#[derive(Debug)]
pub struct Cartridge {
    pub archive: CartridgeArchive,
    pub manifest: Manifest,
}

impl Cartridge {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_archive(CartridgeArchive::open(path)?)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_archive(CartridgeArchive::from_bytes(bytes)?)
    }

    fn from_archive(archive: CartridgeArchive) -> Result<Self> {
        let manifest = parse_manifest(&archive.read_manifest()?)?;
        Ok(Self { archive, manifest })
    }
}
