//! Finding and parsing the assessments a cartridge contains.

use std::collections::BTreeSet;
use std::fmt::Display;

use cc_model::{Assessment, ConversionSummary, IssueKind, ResourceRegistry};

use crate::archive::CartridgeArchive;
use crate::error::ParserError;
use crate::qti::parse_assessment;

/// Parse the first XML file of every resource, in manifest order.
///
/// Documents that are not QTI (web links, discussion topics) and question
/// banks are skipped quietly. Any other failure is recorded against the file and skipped.
/// Each archive path is parsed at most once. `limit` caps the number of
/// assessments returned.
pub fn collect_assessments(
    archive: &CartridgeArchive,
    resources: &ResourceRegistry,
    limit: Option<usize>,
    summary: &mut ConversionSummary,
) -> Vec<Assessment> {
    let mut assessments = Vec::new();
    let mut seen = BTreeSet::new();

    for resource in resources.iter() {
        if limit.is_some_and(|limit| assessments.len() >= limit) {
            tracing::debug!(limit = ?limit, "assessment limit reached");
            break;
        }
        let Some(path) = resource.first_xml_file() else {
            continue;
        };
        if !seen.insert(path.to_string()) {
            continue;
        }

        let bytes = match archive.read(path) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => continue,
            Err(error) => {
                record_failure(summary, path, "reading", &error);
                continue;
            }
        };

        match parse_assessment(&bytes, Some(path), summary) {
            Ok(assessment) => assessments.push(assessment),
            Err(ParserError::NotAssessment { root }) => {
                tracing::debug!(path, root = %root, "not an assessment");
            }
            Err(ParserError::QuestionBank { ident }) => {
                tracing::debug!(path, ident = %ident, "question bank, no assessment");
            }
            Err(error) => record_failure(summary, path, "parsing", &error),
        }
    }

    tracing::info!(count = assessments.len(), "parsed assessments");
    assessments
}

fn record_failure(
    summary: &mut ConversionSummary,
    path: &str,
    action: &str,
    error: &dyn Display,
) {
    tracing::error!(path, %error, "failed {action} assessment resource");
    summary.error(
        IssueKind::AssessmentParse,
        format!("Error {action} resource {path}: {error}"),
        Some(path),
    );
}
