//! Style-resolved assessment content model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Title used for `<assessment>` elements without a `title` attribute.
pub const UNTITLED_ASSESSMENT: &str = "Untitled Assessment";

/// Character formatting effective at one point of a text body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_family: Option<String>,
    /// Size in points.
    pub font_size: Option<f32>,
    pub bold: bool,
    pub color: Option<String>,
    pub superscript: bool,
    pub subscript: bool,
}

impl TextStyle {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub style: TextStyle,
}

impl TextRun {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, TextStyle::default())
    }

    /// Unstyled line break emitted for `<br>` and `</p>`.
    pub fn newline() -> Self {
        Self::plain("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Package-relative path or absolute URL.
    pub src: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// One element of a body in reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextContent {
    Run(TextRun),
    Image(ImageInfo),
}

impl TextContent {
    pub fn as_run(&self) -> Option<&TextRun> {
        match self {
            Self::Run(run) => Some(run),
            Self::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageInfo> {
        match self {
            Self::Run(_) => None,
            Self::Image(image) => Some(image),
        }
    }
}

/// Concatenated text of a body, images skipped.
pub fn plain_text(content: &[TextContent]) -> String {
    content
        .iter()
        .filter_map(TextContent::as_run)
        .map(|run| run.text.as_str())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    Essay,
}

impl QuestionType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple choice",
            Self::Essay => "essay",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseOption {
    pub ident: String,
    pub text: Vec<TextContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub ident: String,
    pub question_type: QuestionType,
    pub text: Vec<TextContent>,
    pub response_options: Vec<ResponseOption>,
    pub correct_response: Option<String>,
}

impl Item {
    pub fn new(ident: impl Into<String>, question_type: QuestionType) -> Self {
        Self {
            ident: ident.into(),
            question_type,
            text: Vec::new(),
            response_options: Vec::new(),
            correct_response: None,
        }
    }

    /// Position of the option matching `correct_response`.
    ///
    /// `None` when the item is ungraded: no correct response, or one that
    /// names no option.
    pub fn correct_option_index(&self) -> Option<usize> {
        let correct = self.correct_response.as_deref()?;
        self.response_options
            .iter()
            .position(|option| option.ident == correct)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub ident: String,
    pub items: Vec<Item>,
    pub metadata: BTreeMap<String, String>,
}

impl Section {
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub ident: String,
    pub title: String,
    pub sections: Vec<Section>,
    pub metadata: BTreeMap<String, String>,
}

impl Assessment {
    pub fn new(ident: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.sections.iter().flat_map(|section| section.items.iter())
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|section| section.items.len()).sum()
    }
}
