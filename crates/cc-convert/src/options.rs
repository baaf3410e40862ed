//! Options for converting one cartridge.

use std::path::PathBuf;
use std::sync::Arc;

use cc_render::{DocumentRenderer, DocxRenderer, FontMap};

/// Name of the directory that receives unreferenced resource files.
pub const LOOSE_FILES_DIR: &str = "loose_files";

/// Where unreferenced resource files are copied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoosePlacement {
    /// `<output>/loose_files`, file names unchanged.
    #[default]
    Private,
    /// A directory shared by several cartridges. File names get a
    /// `<prefix>_` so cartridges do not overwrite each other.
    Shared { dir: PathBuf, prefix: String },
}

impl LoosePlacement {
    pub fn shared(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self::Shared {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }
}

#[derive(Clone)]
pub struct ConvertOptions {
    /// Font family substitutions applied while rendering.
    pub fonts: FontMap,
    /// Maximum number of assessments parsed per cartridge.
    pub limit: Option<usize>,
    pub loose_files: LoosePlacement,
    pub renderer: Arc<dyn DocumentRenderer>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            fonts: FontMap::new(),
            limit: None,
            loose_files: LoosePlacement::default(),
            renderer: Arc::new(DocxRenderer::new()),
        }
    }
}

impl std::fmt::Debug for ConvertOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvertOptions")
            .field("fonts", &self.fonts)
            .field("limit", &self.limit)
            .field("loose_files", &self.loose_files)
            .field("renderer", &self.renderer.extension())
            .finish()
    }
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_fonts(mut self, fonts: FontMap) -> Self {
        self.fonts = fonts;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn with_loose_files(mut self, placement: LoosePlacement) -> Self {
        self.loose_files = placement;
        self
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: impl DocumentRenderer + 'static) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }
}
