//! DOCX rendering with docx-rs.

use std::io::Cursor;

use cc_model::{Assessment, ImageInfo, Item, QuestionType, TextContent, TextStyle};
use docx_rs::{BreakType, Docx, Paragraph, Pic, Run, RunFonts, Style, StyleType, VertAlignType};
use image::GenericImageView;

use crate::assets::load_asset;
use crate::color::{parse_color, to_docx_hex};
use crate::error::{RenderError, Result};
use crate::{DocumentRenderer, RenderContext};

pub const HEADING_STYLE: &str = "Heading1";
pub const QUESTION_STYLE: &str = "Question";
pub const OPTION_STYLE: &str = "MultiAns";

/// Prefix of an unanswered multiple-choice question.
pub const BLANK_PREFIX: &str = "_____ ";

const EMU_PER_PX: u32 = 9525;

/// Widest image that fits the page body (6 inches).
const MAX_IMAGE_WIDTH_EMU: u32 = 5_486_400;

/// Renders an assessment as a Word document: a title heading, one
/// paragraph per question, and one paragraph per multiple-choice option.
///
/// Images are embedded from [`RenderContext::assets`] only. Remote
/// `http(s)` sources are never fetched and render as an `[Image: src]`
/// placeholder, as does any image that cannot be loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxRenderer;

impl DocxRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for DocxRenderer {
    fn extension(&self) -> &'static str {
        "docx"
    }

    fn render(&self, assessment: &Assessment, context: &RenderContext<'_>) -> Result<Vec<u8>> {
        let mut docx = with_styles(Docx::new()).add_paragraph(
            Paragraph::new()
                .style(HEADING_STYLE)
                .add_run(Run::new().add_text(assessment.title.trim())),
        );

        for item in assessment.items() {
            docx = docx.add_paragraph(question_paragraph(item, context));
            if item.question_type == QuestionType::MultipleChoice {
                for (index, option) in item.response_options.iter().enumerate() {
                    let paragraph = Paragraph::new()
                        .style(OPTION_STYLE)
                        .add_run(Run::new().add_text(format!("{}. ", option_letter(index))));
                    docx = docx.add_paragraph(add_content(paragraph, &option.text, context));
                }
            }
        }

        let mut buffer = Vec::new();
        docx.build()
            .pack(&mut Cursor::new(&mut buffer))
            .map_err(|e| RenderError::Pack(e.to_string()))?;
        tracing::debug!(
            title = %assessment.title,
            answer_key = context.answer_key,
            bytes = buffer.len(),
            "rendered docx"
        );
        Ok(buffer)
    }
}

fn with_styles(docx: Docx) -> Docx {
    let heading = Style::new(HEADING_STYLE, StyleType::Paragraph)
        .name("Heading 1")
        .size(32)
        .bold();
    let question = Style::new(QUESTION_STYLE, StyleType::Paragraph).name(QUESTION_STYLE);
    let option = Style::new(OPTION_STYLE, StyleType::Paragraph).name(OPTION_STYLE);
    docx.add_style(heading)
        .add_style(question)
        .add_style(option)
}

/// `A`, `B`, ... for option positions; past `Z` the position number.
pub fn option_letter(index: usize) -> String {
    u8::try_from(index)
        .ok()
        .filter(|&i| i < 26)
        .map_or_else(|| (index + 1).to_string(), |i| char::from(b'A' + i).to_string())
}

/// Prefix for a multiple-choice question. The answer key shows the
/// correct letter when the correct response names one of the options.
pub fn answer_prefix(item: &Item, answer_key: bool) -> String {
    match item.correct_option_index() {
        Some(index) if answer_key => format!("__{}__ ", option_letter(index)),
        _ => BLANK_PREFIX.to_string(),
    }
}

fn question_paragraph(item: &Item, context: &RenderContext<'_>) -> Paragraph {
    let mut paragraph = Paragraph::new().style(QUESTION_STYLE);
    if item.question_type == QuestionType::MultipleChoice {
        let prefix = answer_prefix(item, context.answer_key);
        paragraph = paragraph.add_run(Run::new().add_text(prefix));
    }
    add_content(paragraph, &item.text, context)
}

fn add_content(
    mut paragraph: Paragraph,
    content: &[TextContent],
    context: &RenderContext<'_>,
) -> Paragraph {
    let last = content.len().saturating_sub(1);
    for (index, piece) in content.iter().enumerate() {
        let run = match piece {
            TextContent::Run(run) => {
                let text = if index == last {
                    run.text.trim_end_matches('\n')
                } else {
                    run.text.as_str()
                };
                if text.is_empty() {
                    continue;
                }
                text_run(text, &run.style, context)
            }
            TextContent::Image(image) => image_run(image, context),
        };
        paragraph = paragraph.add_run(run);
    }
    paragraph
}

fn text_run(text: &str, style: &TextStyle, context: &RenderContext<'_>) -> Run {
    let mut run = styled_run(style, context);
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        if !line.is_empty() {
            run = run.add_text(line);
        }
    }
    run
}

fn styled_run(style: &TextStyle, context: &RenderContext<'_>) -> Run {
    let mut run = Run::new();
    if let Some(family) = &style.font_family {
        let family = context.fonts.resolve(family);
        run = run.fonts(
            RunFonts::new()
                .ascii(family)
                .hi_ansi(family)
                .east_asia(family)
                .cs(family),
        );
    }
    if let Some(size) = style.font_size.filter(|size| *size > 0.0) {
        run = run.size(half_points(size));
    }
    if style.bold {
        run = run.bold();
    }
    if let Some(rgb) = style.color.as_deref().and_then(parse_color) {
        run = run.color(to_docx_hex(rgb));
    }
    if style.superscript {
        run.run_property = run.run_property.vert_align(VertAlignType::SuperScript);
    } else if style.subscript {
        run.run_property = run.run_property.vert_align(VertAlignType::SubScript);
    }
    run
}

fn half_points(points: f32) -> usize {
    // Sizes are positive and far below usize::MAX.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let half = (points * 2.0).round() as usize;
    half.max(1)
}

fn image_run(info: &ImageInfo, context: &RenderContext<'_>) -> Run {
    match embed_image(info, context) {
        Ok(pic) => Run::new().add_image(pic),
        Err(reason) => {
            tracing::warn!(src = %info.src, reason, "image not embedded");
            Run::new().add_text(format!("[Image: {}]", info.src))
        }
    }
}

fn embed_image(
    info: &ImageInfo,
    context: &RenderContext<'_>,
) -> std::result::Result<Pic, &'static str> {
    if info.src.starts_with("http://") || info.src.starts_with("https://") {
        return Err("remote images are not fetched");
    }
    let assets = context.assets.ok_or("no asset source")?;
    let bytes = load_asset(assets, &info.src).ok_or("asset not found")?;
    let decoded = image::load_from_memory(&bytes).map_err(|_| "unreadable image data")?;
    let (width, height) = display_size(decoded.dimensions(), info.width, info.height);

    let pic = match image::guess_format(&bytes) {
        Ok(image::ImageFormat::Png | image::ImageFormat::Jpeg) => Pic::new(&bytes),
        _ => {
            let mut png = Vec::new();
            decoded
                .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
                .map_err(|_| "could not convert image to PNG")?;
            Pic::new(&png)
        }
    };
    Ok(pic.size(width, height))
}

/// Display size in EMU from the image's pixel size and the requested
/// `width`/`height` attributes. A single attribute scales the other
/// dimension proportionally; oversize images shrink to the page width.
pub fn display_size(natural: (u32, u32), width: Option<u32>, height: Option<u32>) -> (u32, u32) {
    let (natural_w, natural_h) = (u64::from(natural.0.max(1)), u64::from(natural.1.max(1)));
    let (w, h) = match (width, height) {
        (Some(w), Some(h)) => (u64::from(w), u64::from(h)),
        (Some(w), None) => (u64::from(w), u64::from(w) * natural_h / natural_w),
        (None, Some(h)) => (u64::from(h) * natural_w / natural_h, u64::from(h)),
        (None, None) => (natural_w, natural_h),
    };
    let (mut w_emu, mut h_emu) = (w * u64::from(EMU_PER_PX), h * u64::from(EMU_PER_PX));
    let max_width = u64::from(MAX_IMAGE_WIDTH_EMU);
    if w_emu > max_width {
        h_emu = h_emu * max_width / w_emu;
        w_emu = max_width;
    }
    (
        u32::try_from(w_emu).unwrap_or(MAX_IMAGE_WIDTH_EMU),
        u32::try_from(h_emu).unwrap_or(u32::MAX),
    )
}
