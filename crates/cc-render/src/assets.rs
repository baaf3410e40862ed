//! Where image bytes referenced by question HTML come from.

use std::collections::BTreeMap;
use std::path::PathBuf;

use cc_ingest::CartridgeArchive;
use percent_encoding::percent_decode_str;

/// Lookup of package-relative asset paths.
pub trait AssetSource {
    /// Bytes of the asset at `path`, or `None` when it does not exist or
    /// cannot be read.
    fn read_asset(&self, path: &str) -> Option<Vec<u8>>;
}

impl AssetSource for CartridgeArchive {
    fn read_asset(&self, path: &str) -> Option<Vec<u8>> {
        match self.read(path) {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::debug!(path, %error, "failed to read asset from archive");
                None
            }
        }
    }
}

/// Assets next to a loose QTI file on disk.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for DirectoryAssets {
    fn read_asset(&self, path: &str) -> Option<Vec<u8>> {
        std::fs::read(self.root.join(path)).ok()
    }
}

impl AssetSource for BTreeMap<String, Vec<u8>> {
    fn read_asset(&self, path: &str) -> Option<Vec<u8>> {
        self.get(path).cloned()
    }
}

/// Read `src` as written, then percent-decoded (`my%20image.png`).
pub fn load_asset(source: &dyn AssetSource, src: &str) -> Option<Vec<u8>> {
    if let Some(bytes) = source.read_asset(src) {
        return Some(bytes);
    }
    let decoded = percent_decode_str(src).decode_utf8().ok()?;
    if decoded == src {
        return None;
    }
    source.read_asset(&decoded)
}
