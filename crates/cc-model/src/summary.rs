//! Conversion outcome accumulated across every pipeline stage.
//!
//! Failures never propagate past the item or file they occurred in; each
//! stage records them here instead. Summaries combine monoidally: issue
//! lists concatenate, affected-file sets union, and success is the
//! conjunction of both sides.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// What went wrong, independent of where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// An organization leaf names a resource the manifest does not declare.
    MissingResource,
    /// A resource file listed in the manifest is absent from the archive.
    MissingFile,
    /// An unreferenced resource file is absent from the archive.
    MissingLooseFile,
    /// An assessment could not be paired with a source XML file.
    AssessmentMapping,
    /// A candidate XML file could not be read while correlating.
    XmlReading,
    /// A QTI document failed to parse as a whole.
    AssessmentParse,
    /// One `<item>` failed to parse; the rest of its section survived.
    ItemParse,
    /// A `cc_profile` the parser does not support; downgraded to essay.
    UnsupportedQuestionType,
    /// Rendering an assessment document failed.
    DocxConversion,
    /// Copying or writing a resource file failed.
    FileProcessing,
    /// Copying an unreferenced resource file failed.
    LooseFileCopy,
    /// A whole cartridge could not be opened or read.
    Cartridge,
}

impl IssueKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingResource => "missing_resource",
            Self::MissingFile => "missing_file",
            Self::MissingLooseFile => "missing_loose_file",
            Self::AssessmentMapping => "assessment_mapping",
            Self::XmlReading => "xml_reading",
            Self::AssessmentParse => "assessment_parse",
            Self::ItemParse => "item_parse",
            Self::UnsupportedQuestionType => "unsupported_question_type",
            Self::DocxConversion => "docx_conversion",
            Self::FileProcessing => "file_processing",
            Self::LooseFileCopy => "loose_file_copy",
            Self::Cartridge => "cartridge",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recorded error or warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
    /// Archive path of the affected file, when the issue concerns one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Issue {
    pub fn new(kind: IssueKind, message: impl Into<String>, file_path: Option<&str>) -> Self {
        Self {
            kind,
            message: message.into(),
            file_path: file_path.map(str::to_string),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionSummary {
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
    pub files_with_errors: BTreeSet<String>,
    pub files_with_warnings: BTreeSet<String>,
    /// Failure to write the run's `hierarchy.json`.
    ///
    /// Kept apart from `errors`: it makes the run's index unusable even
    /// when every document rendered.
    pub hierarchy_error: Option<String>,
}

impl ConversionSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, kind: IssueKind, message: impl Into<String>, file_path: Option<&str>) {
        self.push(IssueSeverity::Error, Issue::new(kind, message, file_path));
    }

    pub fn warning(
        &mut self,
        kind: IssueKind,
        message: impl Into<String>,
        file_path: Option<&str>,
    ) {
        self.push(IssueSeverity::Warning, Issue::new(kind, message, file_path));
    }

    pub fn push(&mut self, severity: IssueSeverity, issue: Issue) {
        let (issues, files) = match severity {
            IssueSeverity::Error => (&mut self.errors, &mut self.files_with_errors),
            IssueSeverity::Warning => (&mut self.warnings, &mut self.files_with_warnings),
        };
        if let Some(path) = &issue.file_path {
            files.insert(path.clone());
        }
        issues.push(issue);
    }

    pub fn set_hierarchy_error(&mut self, message: impl Into<String>) {
        self.hierarchy_error = Some(message.into());
    }

    /// Fold `other` into `self`.
    ///
    /// The first hierarchy error wins. Later ones are dropped rather than
    /// recounted as errors; callers that need each cartridge's hierarchy
    /// failure track it separately.
    pub fn merge(&mut self, other: ConversionSummary) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.files_with_errors.extend(other.files_with_errors);
        self.files_with_warnings.extend(other.files_with_warnings);
        if self.hierarchy_error.is_none() {
            self.hierarchy_error = other.hierarchy_error;
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn files_with_error_count(&self) -> usize {
        self.files_with_errors.len()
    }

    pub fn files_with_warning_count(&self) -> usize {
        self.files_with_warnings.len()
    }

    /// No errors and a usable hierarchy. Warnings do not count.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.hierarchy_error.is_none()
    }

    pub fn warnings_of(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.warnings.iter().filter(move |issue| issue.kind == kind)
    }

    pub fn errors_of(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.errors.iter().filter(move |issue| issue.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_do_not_fail_the_run() {
        let mut summary = ConversionSummary::new();
        summary.warning(IssueKind::MissingFile, "gone", Some("a.png"));
        summary.warning(IssueKind::MissingFile, "gone again", Some("a.png"));
        assert!(summary.is_success());
        assert_eq!(summary.warning_count(), 2);
        assert_eq!(summary.files_with_warning_count(), 1);
    }

    #[test]
    fn hierarchy_error_fails_without_errors() {
        let mut summary = ConversionSummary::new();
        summary.set_hierarchy_error("disk full");
        assert_eq!(summary.error_count(), 0);
        assert!(!summary.is_success());
    }

    #[test]
    fn merge_concatenates_and_unions() {
        let mut left = ConversionSummary::new();
        left.error(IssueKind::DocxConversion, "boom", Some("q.xml"));
        let mut right = ConversionSummary::new();
        right.error(IssueKind::FileProcessing, "io", Some("q.xml"));
        right.warning(IssueKind::MissingResource, "R9", None);

        left.merge(right);
        assert_eq!(left.error_count(), 2);
        assert_eq!(left.files_with_error_count(), 1);
        assert_eq!(left.warning_count(), 1);
        assert_eq!(left.files_with_warning_count(), 0);
        assert!(!left.is_success());
    }

    #[test]
    fn merge_keeps_first_hierarchy_error() {
        let mut left = ConversionSummary::new();
        left.set_hierarchy_error("first");
        let mut right = ConversionSummary::new();
        right.set_hierarchy_error("second");
        left.merge(right);
        assert_eq!(left.hierarchy_error.as_deref(), Some("first"));
        assert_eq!(left.error_count(), 0);
        assert!(left.errors_of(IssueKind::FileProcessing).next().is_none());
    }

    #[test]
    fn merge_adopts_incoming_hierarchy_error() {
        let mut left = ConversionSummary::new();
        let mut right = ConversionSummary::new();
        right.set_hierarchy_error("broken manifest");
        left.merge(right);
        assert_eq!(left.hierarchy_error.as_deref(), Some("broken manifest"));
        assert_eq!(left.error_count(), 0);
        assert!(!left.is_success());
    }

    #[test]
    fn merge_with_empty_is_identity() {
        let mut summary = ConversionSummary::new();
        summary.warning(IssueKind::AssessmentMapping, "unmatched", None);
        let before = summary.clone();
        summary.merge(ConversionSummary::new());
        assert_eq!(summary, before);
    }
}
