//! Style interpretation for HTML question text.
//!
//! Each open tag contributes a [`StyleDelta`]; the effective style of a
//! text node is the left fold of every delta still open above it, applied
//! to [`TextStyle::default`]. [`interpret`] is a pure function from a
//! token stream to styled content.

use cc_model::{ImageInfo, TextContent, TextRun, TextStyle};

use super::html::{HtmlToken, is_void};

/// Prefix Common Cartridge uses for paths relative to the resource base.
pub const FILEBASE_TOKEN: &str = "$IMS-CC-FILEBASE$";

/// Absolute sizes for `<font size="1".."7">`, in points.
const FONT_TAG_SIZES: [f32; 7] = [8.0, 10.0, 12.0, 14.0, 18.0, 24.0, 36.0];

/// Base size that relative `<font size="+n">` offsets from.
const FONT_TAG_BASE: f32 = 12.0;

const PX_TO_PT: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    Baseline,
    Super,
    Sub,
}

/// The style change one element introduces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleDelta {
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub bold: Option<bool>,
    pub color: Option<String>,
    pub vertical_align: Option<VerticalAlign>,
}

impl StyleDelta {
    /// Apply this delta on top of `style`.
    pub fn apply(&self, style: &mut TextStyle) {
        if let Some(family) = &self.font_family {
            style.font_family = Some(family.clone());
        }
        if let Some(size) = self.font_size {
            style.font_size = Some(size);
        }
        if let Some(bold) = self.bold {
            style.bold = bold;
        }
        if let Some(color) = &self.color {
            style.color = Some(color.clone());
        }
        match self.vertical_align {
            Some(VerticalAlign::Super) => style.superscript = true,
            Some(VerticalAlign::Sub) => style.subscript = true,
            Some(VerticalAlign::Baseline) => {
                style.superscript = false;
                style.subscript = false;
            }
            None => {}
        }
    }

    /// Fields set in `other` replace those in `self`.
    fn overlay(&mut self, other: StyleDelta) {
        if other.font_family.is_some() {
            self.font_family = other.font_family;
        }
        if other.font_size.is_some() {
            self.font_size = other.font_size;
        }
        if other.bold.is_some() {
            self.bold = other.bold;
        }
        if other.color.is_some() {
            self.color = other.color;
        }
        if other.vertical_align.is_some() {
            self.vertical_align = other.vertical_align;
        }
    }
}

/// Fold open deltas, outermost first, into an effective style.
pub fn resolve<'a>(deltas: impl IntoIterator<Item = &'a StyleDelta>) -> TextStyle {
    deltas
        .into_iter()
        .fold(TextStyle::default(), |mut style, delta| {
            delta.apply(&mut style);
            style
        })
}

/// Delta contributed by an element, from its `style` attribute and the
/// tag's own meaning. Tag semantics win over inline declarations.
pub fn element_delta(tag: &str, attributes: &[(String, String)]) -> StyleDelta {
    let mut delta = HtmlToken::attr(attributes, "style")
        .map(parse_inline_style)
        .unwrap_or_default();

    let mut intrinsic = StyleDelta::default();
    match tag {
        "b" | "strong" => intrinsic.bold = Some(true),
        "sup" => intrinsic.vertical_align = Some(VerticalAlign::Super),
        "sub" => intrinsic.vertical_align = Some(VerticalAlign::Sub),
        "font" => {
            intrinsic.font_family = HtmlToken::attr(attributes, "face").and_then(first_family);
            intrinsic.color = HtmlToken::attr(attributes, "color")
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string);
            intrinsic.font_size = HtmlToken::attr(attributes, "size").and_then(font_tag_size);
        }
        _ => {}
    }
    delta.overlay(intrinsic);
    delta
}

/// Parse a CSS declaration list such as `font-weight: bold; color: red`.
pub fn parse_inline_style(css: &str) -> StyleDelta {
    let mut delta = StyleDelta::default();
    for declaration in css.split(';') {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        let property = property.trim().to_ascii_lowercase();
        let value = value.trim();
        match property.as_str() {
            "font-family" => delta.font_family = first_family(value),
            "font-size" => delta.font_size = css_font_size(value),
            "color" if !value.is_empty() => delta.color = Some(value.to_string()),
            "font-weight" => delta.bold = font_weight(value),
            "vertical-align" => delta.vertical_align = vertical_align(value),
            _ => {}
        }
    }
    delta
}

fn first_family(value: &str) -> Option<String> {
    let family = value
        .split(',')
        .next()?
        .trim()
        .trim_matches(|ch| ch == '"' || ch == '\'')
        .trim();
    (!family.is_empty()).then(|| family.to_string())
}

fn css_font_size(value: &str) -> Option<f32> {
    let value = value.to_ascii_lowercase();
    if let Some(points) = value.strip_suffix("pt") {
        return points.trim().parse().ok();
    }
    if let Some(pixels) = value.strip_suffix("px") {
        return pixels.trim().parse::<f32>().ok().map(|px| px * PX_TO_PT);
    }
    None
}

fn font_weight(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "bold" | "bolder" | "700" | "800" | "900" => Some(true),
        "normal" | "400" => Some(false),
        _ => None,
    }
}

fn vertical_align(value: &str) -> Option<VerticalAlign> {
    match value.to_ascii_lowercase().as_str() {
        "super" => Some(VerticalAlign::Super),
        "sub" => Some(VerticalAlign::Sub),
        "baseline" => Some(VerticalAlign::Baseline),
        _ => None,
    }
}

fn font_tag_size(value: &str) -> Option<f32> {
    let value = value.trim();
    if let Some(step) = value.strip_prefix('+') {
        return step.parse::<u8>().ok().map(|n| FONT_TAG_BASE + 2.0 * f32::from(n));
    }
    if let Some(step) = value.strip_prefix('-') {
        return step.parse::<u8>().ok().map(|n| FONT_TAG_BASE - 2.0 * f32::from(n));
    }
    let index = value.parse::<usize>().ok()?.checked_sub(1)?;
    FONT_TAG_SIZES.get(index).copied()
}

/// Strip the cartridge file-base placeholder from an image path.
pub fn sanitize_src(src: &str) -> String {
    match src.strip_prefix(FILEBASE_TOKEN) {
        Some(rest) => rest
            .replace(FILEBASE_TOKEN, "")
            .trim_start_matches(['.', '/'])
            .to_string(),
        None => src.to_string(),
    }
}

struct OpenElement {
    tag: String,
    delta: StyleDelta,
}

/// Stack of open elements.
///
/// A close tag pops through the nearest matching open element, dropping
/// any unclosed elements above it. A close tag with no open counterpart
/// is ignored.
#[derive(Default)]
struct StyleStack {
    open: Vec<OpenElement>,
}

impl StyleStack {
    fn push(&mut self, tag: String, delta: StyleDelta) {
        self.open.push(OpenElement { tag, delta });
    }

    fn close(&mut self, tag: &str) {
        if let Some(index) = self.open.iter().rposition(|element| element.tag == tag) {
            self.open.truncate(index);
        }
    }

    fn current(&self) -> TextStyle {
        resolve(self.open.iter().map(|element| &element.delta))
    }
}

/// Turn a token stream into styled runs and images.
///
/// `<br>` and `</p>` produce newline runs; empty text produces nothing.
pub fn interpret(tokens: Vec<HtmlToken>) -> Vec<TextContent> {
    let mut stack = StyleStack::default();
    let mut content = Vec::new();

    for token in tokens {
        match token {
            HtmlToken::Open {
                name,
                attributes,
                self_closing,
            } => {
                match name.as_str() {
                    "br" => content.push(TextContent::Run(TextRun::newline())),
                    "img" => {
                        if let Some(image) = image_info(&attributes) {
                            content.push(TextContent::Image(image));
                        }
                    }
                    _ => {}
                }
                if !self_closing && !is_void(&name) {
                    let delta = element_delta(&name, &attributes);
                    stack.push(name, delta);
                }
            }
            HtmlToken::Close { name } => {
                stack.close(&name);
                if name == "p" {
                    content.push(TextContent::Run(TextRun::newline()));
                }
            }
            HtmlToken::Text(text) => {
                if !text.is_empty() {
                    content.push(TextContent::Run(TextRun::new(text, stack.current())));
                }
            }
        }
    }
    content
}

fn image_info(attributes: &[(String, String)]) -> Option<ImageInfo> {
    let src = HtmlToken::attr(attributes, "src").filter(|src| !src.is_empty())?;
    let dimension = |name: &str| -> Option<u32> {
        HtmlToken::attr(attributes, name).and_then(|value| value.trim().parse().ok())
    };
    Some(ImageInfo {
        src: sanitize_src(src),
        width: dimension("width"),
        height: dimension("height"),
    })
}
