use std::path::PathBuf;

use cc_convert::{CartridgeOutcome, HierarchyFailure, QtiOutcome, SessionOutcome};
use cc_model::ConversionSummary;

/// What a `convert` run was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunKind {
    /// One `.imscc` archive.
    Cartridge,
    /// A directory of archives; holds the converted cartridge names.
    Session { cartridges: Vec<String> },
    /// A standalone QTI assessment file.
    Qti,
}

#[derive(Debug)]
pub struct RunReport {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub kind: RunKind,
    /// Rendered documents, only tracked for standalone QTI files.
    pub documents: Vec<PathBuf>,
    pub summary: ConversionSummary,
    pub hierarchy_failures: Vec<HierarchyFailure>,
    /// Final status line and its progress value.
    pub message: (String, f64),
}

impl RunReport {
    pub fn from_cartridge(input: PathBuf, outcome: CartridgeOutcome) -> Self {
        let message = cc_convert::final_message(&outcome.summary);
        Self {
            input,
            output_dir: outcome.output_dir,
            kind: RunKind::Cartridge,
            documents: Vec::new(),
            summary: outcome.summary,
            hierarchy_failures: Vec::new(),
            message,
        }
    }

    pub fn from_session(input: PathBuf, output_dir: PathBuf, outcome: SessionOutcome) -> Self {
        let message = cc_convert::session_message(&outcome);
        Self {
            input,
            output_dir,
            kind: RunKind::Session {
                cartridges: outcome
                    .cartridges
                    .iter()
                    .map(|(name, _)| name.clone())
                    .collect(),
            },
            documents: Vec::new(),
            summary: outcome.summary,
            hierarchy_failures: outcome.hierarchy_failures,
            message,
        }
    }

    pub fn from_qti(input: PathBuf, output_dir: PathBuf, outcome: QtiOutcome) -> Self {
        let message = cc_convert::final_message(&outcome.summary);
        Self {
            input,
            output_dir,
            kind: RunKind::Qti,
            documents: outcome.documents,
            summary: outcome.summary,
            hierarchy_failures: Vec::new(),
            message,
        }
    }

    /// Errors, a failed hierarchy, or a failed combined hierarchy.
    pub fn has_errors(&self) -> bool {
        !self.summary.is_success() || !self.hierarchy_failures.is_empty()
    }
}

/// One row of the `assessments` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentRow {
    pub title: String,
    pub ident: String,
    pub multiple_choice: usize,
    pub essay: usize,
    /// Archive path of the correlated source file.
    pub source: Option<String>,
}

impl AssessmentRow {
    pub fn item_count(&self) -> usize {
        self.multiple_choice + self.essay
    }
}
