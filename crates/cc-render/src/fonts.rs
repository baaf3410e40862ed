//! Source-to-output font family substitution.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};

/// Maps font families found in question HTML to families available to
/// the document reader. Unmapped families pass through unchanged.
///
/// Loaded from a flat JSON object, e.g. `{"Symbol": "Cambria Math"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FontMap {
    families: BTreeMap<String, String>,
}

impl FontMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| RenderError::FontMapRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| RenderError::FontMapParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.families.insert(from.into(), to.into());
        self
    }

    pub fn resolve<'a>(&'a self, family: &'a str) -> &'a str {
        self.families.get(family).map_or(family, String::as_str)
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_mapped_and_passes_through_unmapped() {
        let fonts = FontMap::new().with("Symbol", "Cambria Math");
        assert_eq!(fonts.resolve("Symbol"), "Cambria Math");
        assert_eq!(fonts.resolve("Arial"), "Arial");
    }

    #[test]
    fn loads_from_json_object() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("fonts.json");
        std::fs::write(&path, r#"{"Wingdings": "Segoe UI Symbol", "Times": "Times New Roman"}"#)
            .expect("write font map");

        let fonts = FontMap::from_json_file(&path).expect("load font map");
        assert_eq!(fonts.len(), 2);
        assert_eq!(fonts.resolve("Times"), "Times New Roman");
    }

    #[test]
    fn rejects_non_object_json() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("fonts.json");
        std::fs::write(&path, "[1, 2]").expect("write font map");

        let err = FontMap::from_json_file(&path).unwrap_err();
        assert!(matches!(err, RenderError::FontMapParse { .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = FontMap::from_json_file(Path::new("/nonexistent/fonts.json")).unwrap_err();
        assert!(matches!(err, RenderError::FontMapRead { .. }));
    }
}
