//! `hierarchy.json`: the index of a converted cartridge or session.

use std::fs;
use std::path::{Path, PathBuf};

use cc_model::HierarchyNode;
use serde::Serialize;

use crate::error::{ConvertError, Result};

pub const HIERARCHY_FILE: &str = "hierarchy.json";

/// Title of a multi-cartridge index.
pub const COMBINED_TITLE: &str = "Cartridge Collection";

/// Index of a multi-cartridge session.
#[derive(Debug, Clone, Serialize)]
pub struct CombinedHierarchy {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: String,
    pub cartridges: Vec<CartridgeHierarchy>,
    /// Session-relative loose files directory, when one was written.
    pub loose_files_path: Option<String>,
}

impl CombinedHierarchy {
    pub fn new(cartridges: Vec<CartridgeHierarchy>, loose_files_path: Option<String>) -> Self {
        Self {
            kind: "combined_cartridges",
            title: COMBINED_TITLE.to_string(),
            cartridges,
            loose_files_path,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CartridgeHierarchy {
    pub cartridge_name: String,
    /// Cartridge output directory relative to the session output.
    pub cartridge_path: String,
    pub hierarchy: HierarchyNode,
}

/// Write `value` as pretty JSON to `<dir>/hierarchy.json`.
pub fn write_hierarchy<T: Serialize + ?Sized>(dir: &Path, value: &T) -> Result<PathBuf> {
    let path = dir.join(HIERARCHY_FILE);
    let json = serde_json::to_vec_pretty(value)?;
    fs::write(&path, json).map_err(|e| ConvertError::io(&path, e))?;
    tracing::debug!(path = %path.display(), "wrote hierarchy");
    Ok(path)
}
