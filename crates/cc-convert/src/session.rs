//! Converting a directory of cartridges in one session.
//!
//! Cartridges are converted one at a time, in name order, each into
//! `<output>/<stem>/`. Loose files from every cartridge share
//! `<output>/loose_files`, prefixed with the cartridge stem.

use std::fs;
use std::path::{Path, PathBuf};

use cc_model::{ConversionSummary, IssueKind};
use tracing::{error, info};

use crate::convert::{CartridgeOutcome, convert_cartridge};
use crate::error::{ConvertError, Result};
use crate::hierarchy_json::{CartridgeHierarchy, CombinedHierarchy, write_hierarchy};
use crate::options::{ConvertOptions, LOOSE_FILES_DIR, LoosePlacement};
use crate::progress::{PROGRESS_COMPLETE, PROGRESS_FAILED, ProgressSink, ScaledSink};

pub const CARTRIDGE_EXTENSION: &str = "imscc";

/// A failed `hierarchy.json` write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyFailure {
    /// Cartridge stem, or `None` for the combined index.
    pub cartridge: Option<String>,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct SessionOutcome {
    /// Cartridges that could be opened, in conversion order.
    pub cartridges: Vec<(String, CartridgeOutcome)>,
    pub hierarchy_failures: Vec<HierarchyFailure>,
    /// Every cartridge's summary merged, plus cartridge-level failures.
    pub summary: ConversionSummary,
}

impl SessionOutcome {
    pub fn is_success(&self) -> bool {
        self.summary.error_count() == 0 && self.hierarchy_failures.is_empty()
    }
}

/// `*.imscc` files directly inside `dir`, sorted by file name.
pub fn find_cartridges(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| ConvertError::io(dir, e))?;
    let mut cartridges = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| ConvertError::io(dir, e))?.path();
        let is_cartridge = path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(CARTRIDGE_EXTENSION));
        if is_cartridge {
            cartridges.push(path);
        }
    }
    cartridges.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(cartridges)
}

/// Convert every cartridge in `input_dir` into `output_dir`.
///
/// A cartridge that cannot be opened is recorded as an error and the
/// session moves on. Finding no cartridges at all is an error.
pub fn convert_session(
    input_dir: &Path,
    output_dir: &Path,
    options: &ConvertOptions,
    sink: &mut dyn ProgressSink,
) -> Result<SessionOutcome> {
    let cartridges = find_cartridges(input_dir)?;
    if cartridges.is_empty() {
        sink.report("No .imscc files found in input directory", Some(PROGRESS_FAILED));
        return Err(ConvertError::NoCartridges(input_dir.to_path_buf()));
    }
    info!(count = cartridges.len(), input = %input_dir.display(), "found cartridges");

    fs::create_dir_all(output_dir).map_err(|e| ConvertError::io(output_dir, e))?;
    let shared_loose = output_dir.join(LOOSE_FILES_DIR);
    let mut outcome = SessionOutcome::default();

    for (index, path) in cartridges.iter().enumerate() {
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let options = options
            .clone()
            .with_loose_files(LoosePlacement::shared(&shared_loose, &stem));

        let mut scaled = ScaledSink::new(sink, index, cartridges.len());
        scaled.report(&format!("Processing {file}..."), Some(0.0));

        match convert_cartridge(path, &output_dir.join(&stem), &options, &mut scaled) {
            Ok(cartridge) => {
                if let Some(error) = &cartridge.summary.hierarchy_error {
                    outcome.hierarchy_failures.push(HierarchyFailure {
                        cartridge: Some(stem.clone()),
                        error: error.clone(),
                    });
                }
                outcome.summary.merge(cartridge.summary.clone());
                outcome.cartridges.push((stem, cartridge));
            }
            Err(error) => {
                error!(cartridge = %file, %error, "cartridge failed");
                outcome.summary.error(
                    IssueKind::Cartridge,
                    format!("Could not convert {file}: {error}"),
                    Some(&path.display().to_string()),
                );
            }
        }
    }

    write_combined(output_dir, &shared_loose, &mut outcome);

    let (message, progress) = session_message(&outcome);
    info!(progress, "{message}");
    sink.report(&message, Some(progress));
    Ok(outcome)
}

fn write_combined(output_dir: &Path, shared_loose: &Path, outcome: &mut SessionOutcome) {
    if outcome.cartridges.is_empty() {
        return;
    }
    let cartridges = outcome
        .cartridges
        .iter()
        .map(|(stem, cartridge)| CartridgeHierarchy {
            cartridge_name: stem.clone(),
            cartridge_path: stem.clone(),
            hierarchy: cartridge.hierarchy.clone(),
        })
        .collect();
    let loose_files_path = shared_loose
        .is_dir()
        .then(|| LOOSE_FILES_DIR.to_string());
    let combined = CombinedHierarchy::new(cartridges, loose_files_path);

    if let Err(error) = write_hierarchy(output_dir, &combined) {
        let message = format!("Failed to create hierarchy.json: {error}");
        error!("{message}");
        outcome.hierarchy_failures.push(HierarchyFailure {
            cartridge: None,
            error: message.clone(),
        });
        if outcome.summary.hierarchy_error.is_none() {
            outcome.summary.set_hierarchy_error(message);
        }
    }
}

/// Closing progress event of a session.
pub fn session_message(outcome: &SessionOutcome) -> (String, f64) {
    let summary = &outcome.summary;
    let warnings = summary.warning_count();
    if outcome.is_success() {
        if warnings > 0 {
            (
                format!(
                    "Conversion completed with {warnings} warnings across {} files!",
                    summary.files_with_warning_count()
                ),
                PROGRESS_COMPLETE,
            )
        } else {
            ("Conversion completed successfully!".to_string(), PROGRESS_COMPLETE)
        }
    } else {
        let mut message = format!(
            "Conversion completed with {} errors affecting {} files",
            summary.error_count(),
            summary.files_with_error_count()
        );
        if warnings > 0 {
            message.push_str(&format!(" and {warnings} warnings"));
        }
        if !outcome.hierarchy_failures.is_empty() {
            message.push_str(&format!(
                " ({} hierarchy creation errors)",
                outcome.hierarchy_failures.len()
            ));
        }
        message.push('!');
        (message, PROGRESS_FAILED)
    }
}
