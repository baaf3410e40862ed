//! QTI 1.2 assessment parsing.
//!
//! Parsing is lenient below the assessment level: a broken `<item>` is
//! recorded on the [`ConversionSummary`] and skipped, and an unsupported
//! question profile degrades to an essay with a warning.

pub mod entities;
pub mod html;
pub mod style;

use std::collections::BTreeMap;

use cc_model::{
    Assessment, ConversionSummary, IssueKind, Item, QuestionType, ResponseOption, Section,
    TextContent, UNTITLED_ASSESSMENT,
};

use crate::error::ParserError;
use crate::xml::{XmlElement, parse_document};

pub use entities::strip_unknown_entities;
pub use style::{FILEBASE_TOKEN, sanitize_src};

/// Root element of every QTI document.
pub const QTI_ROOT: &str = "questestinterop";

/// Metadata field naming the Common Cartridge question profile.
pub const PROFILE_FIELD: &str = "cc_profile";

/// Parse HTML question text into styled runs and images.
///
/// Character references are decoded once, up front; the tokenizer never
/// decodes again.
pub fn parse_html_content(markup: &str) -> Vec<TextContent> {
    let decoded = html_escape::decode_html_entities(markup);
    style::interpret(html::tokenize(&decoded))
}

/// Parse one QTI document.
///
/// `source` is the archive path used to attribute recoverable issues.
pub fn parse_assessment(
    xml: &[u8],
    source: Option<&str>,
    summary: &mut ConversionSummary,
) -> Result<Assessment, ParserError> {
    let cleaned = strip_unknown_entities(xml);
    let root = parse_document(&cleaned)?;
    if !root.is_named(QTI_ROOT) {
        return Err(ParserError::NotAssessment {
            root: root.name.clone(),
        });
    }

    let Some(element) = root.find("assessment") else {
        if let Some(bank) = root.child("objectbank") {
            return Err(ParserError::QuestionBank {
                ident: bank.attr("ident").unwrap_or_default().to_string(),
            });
        }
        return Err(ParserError::missing("assessment", QTI_ROOT));
    };

    let mut assessment = Assessment::new(
        element.attr("ident").unwrap_or_default(),
        element.attr("title").unwrap_or(UNTITLED_ASSESSMENT),
    );
    assessment.metadata = metadata_fields(direct_metadata(element));

    for section_element in element.find_all("section") {
        assessment
            .sections
            .push(parse_section(section_element, source, summary));
    }

    tracing::debug!(
        ident = %assessment.ident,
        sections = assessment.sections.len(),
        items = assessment.item_count(),
        "parsed assessment"
    );
    Ok(assessment)
}

fn parse_section(
    element: &XmlElement,
    source: Option<&str>,
    summary: &mut ConversionSummary,
) -> Section {
    let mut section = Section::new(element.attr("ident").unwrap_or_default());
    section.metadata = metadata_fields(direct_metadata(element));

    for item_element in element.children_named("item") {
        match parse_item(item_element, source, summary) {
            Ok(item) => section.items.push(item),
            Err(error) => {
                let ident = item_element.attr("ident").unwrap_or_default();
                tracing::warn!(item = ident, %error, "skipping unparseable item");
                summary.error(
                    IssueKind::ItemParse,
                    format!("Error parsing item {ident}: {error}"),
                    source,
                );
            }
        }
    }
    section
}

fn parse_item(
    element: &XmlElement,
    source: Option<&str>,
    summary: &mut ConversionSummary,
) -> Result<Item, ParserError> {
    let ident = element.attr("ident").unwrap_or_default();
    let metadata = metadata_fields(
        element
            .child("itemmetadata")
            .and_then(|wrapper| wrapper.child("qtimetadata")),
    );
    let profile = metadata.get(PROFILE_FIELD).map_or("", String::as_str);

    let question_type = classify_profile(profile).unwrap_or_else(|| {
        tracing::warn!(item = ident, profile, "unsupported question type, treating as essay");
        summary.warning(
            IssueKind::UnsupportedQuestionType,
            format!("Unsupported question type '{profile}' for item {ident}, treating as essay"),
            source,
        );
        QuestionType::Essay
    });

    let context = format!("item {ident}");
    let presentation = element
        .child("presentation")
        .ok_or_else(|| ParserError::missing("presentation", context.as_str()))?;
    let material = presentation
        .child("material")
        .ok_or_else(|| ParserError::missing("material", context.as_str()))?;

    let mut item = Item::new(ident, question_type);
    item.text = material_content(material);

    if question_type == QuestionType::MultipleChoice {
        item.response_options = response_options(presentation);
        item.correct_response = correct_response(element);
    }
    Ok(item)
}

/// Map a `cc_profile` value to a question type. `None` means unsupported.
pub fn classify_profile(profile: &str) -> Option<QuestionType> {
    if profile.contains("multiple_choice") {
        Some(QuestionType::MultipleChoice)
    } else if profile.contains("essay") {
        Some(QuestionType::Essay)
    } else {
        None
    }
}

fn material_content(material: &XmlElement) -> Vec<TextContent> {
    material
        .child("mattext")
        .map(|mattext| parse_html_content(&mattext.text()))
        .unwrap_or_default()
}

fn response_options(presentation: &XmlElement) -> Vec<ResponseOption> {
    let Some(choices) = presentation
        .find("response_lid")
        .and_then(|lid| lid.child("render_choice"))
    else {
        return Vec::new();
    };

    choices
        .children_named("response_label")
        .filter_map(|label| {
            let material = label.child("material")?;
            Some(ResponseOption {
                ident: label.attr("ident").unwrap_or_default().to_string(),
                text: material_content(material),
            })
        })
        .collect()
}

fn correct_response(item: &XmlElement) -> Option<String> {
    item.child("resprocessing")?
        .children_named("respcondition")
        .filter_map(|condition| condition.child("conditionvar")?.find("varequal"))
        .map(XmlElement::trimmed_text)
        .find(|value| !value.is_empty())
}

/// `<qtimetadata>` directly under `element`, or inside an `<itemmetadata>` wrapper.
fn direct_metadata(element: &XmlElement) -> Option<&XmlElement> {
    element.child("qtimetadata").or_else(|| {
        element
            .child("itemmetadata")
            .and_then(|wrapper| wrapper.child("qtimetadata"))
    })
}

/// Collect `qtimetadatafield` label/entry pairs with non-empty values.
fn metadata_fields(metadata: Option<&XmlElement>) -> BTreeMap<String, String> {
    let Some(metadata) = metadata else {
        return BTreeMap::new();
    };
    metadata
        .children_named("qtimetadatafield")
        .filter_map(|field| {
            let label = field.child("fieldlabel")?.trimmed_text();
            let entry = field.child("fieldentry")?.trimmed_text();
            (!label.is_empty() && !entry.is_empty()).then_some((label, entry))
        })
        .collect()
}
