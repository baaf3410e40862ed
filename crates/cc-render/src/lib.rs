//! Rendering parsed assessments to documents.
//!
//! [`DocumentRenderer`] is the seam between the conversion pipeline and a
//! concrete output format; [`DocxRenderer`] is the Word implementation.

pub mod assets;
pub mod color;
pub mod docx;
pub mod error;
pub mod fonts;

use cc_model::Assessment;

pub use assets::{AssetSource, DirectoryAssets, load_asset};
pub use docx::DocxRenderer;
pub use error::{RenderError, Result};
pub use fonts::FontMap;

/// Turns one assessment into the bytes of one document.
pub trait DocumentRenderer {
    /// File extension of produced documents, without the dot.
    fn extension(&self) -> &'static str;

    fn render(&self, assessment: &Assessment, context: &RenderContext<'_>) -> Result<Vec<u8>>;
}

/// Inputs a render needs besides the assessment itself.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    /// Where embedded images are looked up; `None` renders placeholders.
    pub assets: Option<&'a dyn AssetSource>,
    pub fonts: &'a FontMap,
    /// Fill in the correct option for multiple-choice questions.
    pub answer_key: bool,
}

impl<'a> RenderContext<'a> {
    pub fn new(fonts: &'a FontMap) -> Self {
        Self {
            assets: None,
            fonts,
            answer_key: false,
        }
    }

    pub fn with_assets(mut self, assets: &'a dyn AssetSource) -> Self {
        self.assets = Some(assets);
        self
    }

    pub fn answer_key(mut self, answer_key: bool) -> Self {
        self.answer_key = answer_key;
        self
    }
}

impl std::fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("assets", &self.assets.is_some())
            .field("fonts", &self.fonts)
            .field("answer_key", &self.answer_key)
            .finish()
    }
}
