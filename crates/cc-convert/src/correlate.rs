//! Pairing parsed assessments with the XML files they came from.
//!
//! Nothing in a cartridge links an `<assessment>` back to its file, so
//! the pairing sniffs file contents. Rules are tried from most to least
//! specific:
//!
//! 1. the exact title occurs in the file
//! 2. the file's first `ident="..."` attribute equals the assessment ident
//! 3. the title occurs ignoring case
//! 4. the first 20 characters of the title occur
//!
//! For each assessment, files are tried in archive order and the first
//! file satisfying any rule wins. Two assessments sharing a title prefix
//! can land on the same file; a later assessment then replaces the
//! earlier one for that file.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use cc_ingest::{CartridgeArchive, MANIFEST_NAME};
use cc_model::{Assessment, IssueKind};
use regex::Regex;

use crate::progress::Reporter;

static IDENT_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"ident="([^"]+)""#).expect("Invalid ident attribute regex"));

const TITLE_PREFIX_CHARS: usize = 20;

/// XML file path to the assessment parsed from it.
#[derive(Debug, Default)]
pub struct Correlation<'a> {
    by_file: BTreeMap<String, &'a Assessment>,
}

impl<'a> Correlation<'a> {
    pub fn get(&self, path: &str) -> Option<&'a Assessment> {
        self.by_file.get(path).copied()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.by_file.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.by_file.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_file.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &'a Assessment)> + '_ {
        self.by_file
            .iter()
            .map(|(path, assessment)| (path.as_str(), *assessment))
    }

    fn is_mapped(&self, assessment: &Assessment) -> bool {
        self.by_file
            .values()
            .any(|mapped| std::ptr::eq(*mapped, assessment))
    }
}

/// A candidate file and its decoded contents.
#[derive(Debug, Clone)]
pub struct XmlCandidate {
    pub path: String,
    pub contents: String,
}

/// Read every XML entry except the manifest, in archive order.
///
/// Unreadable or non-UTF-8 files are skipped with a warning.
pub fn read_candidates(archive: &CartridgeArchive, reporter: &mut Reporter<'_>) -> Vec<XmlCandidate> {
    let mut candidates = Vec::new();
    for entry in archive.xml_entries() {
        if entry.name == MANIFEST_NAME {
            continue;
        }
        let bytes = match archive.read(&entry.name) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => continue,
            Err(error) => {
                reporter.warning(
                    IssueKind::XmlReading,
                    format!("Could not read XML file {} for assessment mapping: {error}", entry.name),
                    Some(&entry.name),
                );
                continue;
            }
        };
        match String::from_utf8(bytes) {
            Ok(contents) => candidates.push(XmlCandidate {
                path: entry.name.clone(),
                contents,
            }),
            Err(error) => reporter.warning(
                IssueKind::XmlReading,
                format!("Could not read XML file {} for assessment mapping: {error}", entry.name),
                Some(&entry.name),
            ),
        }
    }
    candidates
}

/// Pair each assessment with a candidate file.
///
/// Unmatched assessments are reported as warnings.
pub fn correlate<'a>(
    assessments: &'a [Assessment],
    candidates: &[XmlCandidate],
    reporter: &mut Reporter<'_>,
) -> Correlation<'a> {
    let mut correlation = Correlation::default();
    for assessment in assessments {
        if let Some(candidate) = candidates
            .iter()
            .find(|candidate| matches(assessment, &candidate.contents))
        {
            tracing::debug!(
                assessment = %assessment.title,
                file = %candidate.path,
                "correlated assessment"
            );
            correlation
                .by_file
                .insert(candidate.path.clone(), assessment);
        }
    }

    for assessment in assessments {
        if !correlation.is_mapped(assessment) {
            reporter.warning(
                IssueKind::AssessmentMapping,
                format!(
                    "Could not find XML file for assessment '{}' (ID: {})",
                    assessment.title, assessment.ident
                ),
                None,
            );
        }
    }
    correlation
}

fn matches(assessment: &Assessment, contents: &str) -> bool {
    let title = assessment.title.as_str();
    if contents.contains(title) {
        return true;
    }
    if IDENT_ATTR
        .captures(contents)
        .is_some_and(|captures| captures[1] == assessment.ident)
    {
        return true;
    }
    if contents.to_lowercase().contains(&title.to_lowercase()) {
        return true;
    }
    let prefix: String = title.chars().take(TITLE_PREFIX_CHARS).collect();
    contents.contains(&prefix)
}

#[cfg(test)]
mod tests {
    use crate::progress::NoProgress;

    use super::*;

    fn candidate(path: &str, contents: &str) -> XmlCandidate {
        XmlCandidate {
            path: path.to_string(),
            contents: contents.to_string(),
        }
    }

    fn qti(ident: &str, title: &str) -> String {
        format!(r#"<questestinterop><assessment ident="{ident}" title="{title}"/></questestinterop>"#)
    }

    fn pairs<'a>(correlation: &Correlation<'a>) -> Vec<(String, String)> {
        correlation
            .iter()
            .map(|(path, assessment)| (path.to_string(), assessment.ident.clone()))
            .collect()
    }

    #[test]
    fn matches_by_title_then_ident_then_case() {
        let assessments = [
            Assessment::new("A1", "Quiz One"),
            Assessment::new("A2", "Renamed later"),
            Assessment::new("A3", "LOUD TITLE"),
        ];
        let candidates = [
            candidate("a/one.xml", &qti("A1", "Quiz One")),
            candidate("b/two.xml", &qti("A2", "Original name")),
            candidate("c/three.xml", &qti("A3", "loud title")),
        ];
        let mut sink = NoProgress;
        let mut reporter = Reporter::new(&mut sink);
        let correlation = correlate(&assessments, &candidates, &mut reporter);

        assert_eq!(
            pairs(&correlation),
            [
                ("a/one.xml".to_string(), "A1".to_string()),
                ("b/two.xml".to_string(), "A2".to_string()),
                ("c/three.xml".to_string(), "A3".to_string()),
            ]
        );
        assert_eq!(reporter.summary().warning_count(), 0);
    }

    #[test]
    fn unmatched_assessment_is_a_warning() {
        let assessments = [Assessment::new("X9", "Nowhere to be found")];
        let candidates = [candidate("a.xml", &qti("A1", "Quiz"))];
        let mut sink = NoProgress;
        let mut reporter = Reporter::new(&mut sink);
        let correlation = correlate(&assessments, &candidates, &mut reporter);

        assert!(correlation.is_empty());
        let summary = reporter.into_summary();
        assert_eq!(summary.error_count(), 0);
        let warning = &summary.warnings[0];
        assert_eq!(warning.kind, IssueKind::AssessmentMapping);
        assert_eq!(
            warning.message,
            "Could not find XML file for assessment 'Nowhere to be found' (ID: X9)"
        );
    }

    #[test]
    fn same_inputs_give_same_mapping() {
        let assessments = [
            Assessment::new("A1", "Week 1 Quiz"),
            Assessment::new("A2", "Week 2 Quiz"),
        ];
        let candidates = [
            candidate("w2.xml", &qti("A2", "Week 2 Quiz")),
            candidate("w1.xml", &qti("A1", "Week 1 Quiz")),
        ];
        let mut sink = NoProgress;
        let mut first = Reporter::new(&mut sink);
        let once = pairs(&correlate(&assessments, &candidates, &mut first));
        let mut sink = NoProgress;
        let mut second = Reporter::new(&mut sink);
        let again = pairs(&correlate(&assessments, &candidates, &mut second));
        assert_eq!(once, again);
    }

    /// Titles sharing their first 20 characters are indistinguishable to
    /// the prefix rule: the second assessment claims the first file too.
    #[test]
    fn shared_title_prefix_can_mismatch() {
        let assessments = [
            Assessment::new("A1", "Chapter Review Questions: Cells"),
            Assessment::new("A2", "Chapter Review Questions: Genes"),
        ];
        let candidates = [
            candidate("cells.xml", &qti("A1", "Chapter Review Questions: Cells")),
            candidate("genes.xml", &qti("G-2", "chapter review questions")),
        ];
        let mut sink = NoProgress;
        let mut reporter = Reporter::new(&mut sink);
        let correlation = correlate(&assessments, &candidates, &mut reporter);

        assert_eq!(correlation.get("cells.xml").map(|a| a.ident.as_str()), Some("A2"));
        assert!(!correlation.contains("genes.xml"));
        // A1 lost its file, so it is reported as unmatched.
        assert_eq!(reporter.summary().warning_count(), 1);
    }
}
