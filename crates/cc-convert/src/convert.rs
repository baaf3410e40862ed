//! Converting one cartridge, or one standalone QTI file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use cc_ingest::{Cartridge, collect_assessments, parse_assessment};
use cc_model::{ConversionSummary, HierarchyNode};
use cc_render::{DirectoryAssets, RenderContext};
use tracing::{info, info_span};

use crate::correlate::{correlate, read_candidates};
use crate::error::{ConvertError, Result};
use crate::hierarchy_json::write_hierarchy;
use crate::loose::{LooseFiles, copy_loose_files};
use crate::materialize::{MaterializeInput, materialize};
use crate::options::ConvertOptions;
use crate::progress::{PROGRESS_COMPLETE, PROGRESS_FAILED, ProgressSink, Reporter};

/// What converting one cartridge produced.
#[derive(Debug)]
pub struct CartridgeOutcome {
    pub output_dir: PathBuf,
    pub hierarchy: HierarchyNode,
    pub loose_files: LooseFiles,
    pub summary: ConversionSummary,
}

/// Convert the cartridge at `path` into `output_dir`.
///
/// Only failing to create the output directory or to open the cartridge
/// is an error; everything else is recorded in the outcome's summary.
pub fn convert_cartridge(
    path: &Path,
    output_dir: &Path,
    options: &ConvertOptions,
    sink: &mut dyn ProgressSink,
) -> Result<CartridgeOutcome> {
    let span = info_span!("cartridge", path = %path.display());
    let _guard = span.enter();

    fs::create_dir_all(output_dir).map_err(|e| ConvertError::io(output_dir, e))?;
    let start = Instant::now();
    let cartridge = Cartridge::open(path)?;
    info!(
        resources = cartridge.manifest.resources.len(),
        duration_ms = start.elapsed().as_millis(),
        "opened cartridge"
    );
    Ok(convert_opened(&cartridge, output_dir, options, sink))
}

/// Convert an already opened cartridge. `output_dir` must exist.
pub fn convert_opened(
    cartridge: &Cartridge,
    output_dir: &Path,
    options: &ConvertOptions,
    sink: &mut dyn ProgressSink,
) -> CartridgeOutcome {
    let mut reporter = Reporter::new(sink);
    let archive = &cartridge.archive;
    let manifest = &cartridge.manifest;

    let start = Instant::now();
    let assessments = collect_assessments(
        archive,
        &manifest.resources,
        options.limit,
        reporter.summary_mut(),
    );
    let candidates = read_candidates(archive, &mut reporter);
    let correlation = correlate(&assessments, &candidates, &mut reporter);
    info!(
        assessments = assessments.len(),
        correlated = correlation.len(),
        duration_ms = start.elapsed().as_millis(),
        "parse complete"
    );

    let start = Instant::now();
    let input = MaterializeInput {
        archive,
        manifest,
        correlation: &correlation,
        renderer: options.renderer.as_ref(),
        fonts: &options.fonts,
    };
    let materialized = materialize(&input, output_dir, &mut reporter);
    let loose_files = copy_loose_files(
        archive,
        manifest,
        &materialized.processed,
        output_dir,
        &options.loose_files,
        &mut reporter,
    );
    info!(
        nodes = materialized.hierarchy.descendant_count(),
        files = materialized.hierarchy.all_files().len(),
        loose = loose_files.copied,
        duration_ms = start.elapsed().as_millis(),
        "materialize complete"
    );

    if let Err(error) = write_hierarchy(output_dir, &materialized.hierarchy) {
        let message = format!("Failed to create hierarchy.json: {error}");
        tracing::error!("{message}");
        reporter.summary_mut().set_hierarchy_error(message);
    }

    let (message, progress) = final_message(reporter.summary());
    reporter.progress(&message, Some(progress));

    CartridgeOutcome {
        output_dir: output_dir.to_path_buf(),
        hierarchy: materialized.hierarchy,
        loose_files,
        summary: reporter.into_summary(),
    }
}

/// Closing progress event of a cartridge run.
pub fn final_message(summary: &ConversionSummary) -> (String, f64) {
    let warnings = summary.warning_count();
    if summary.is_success() {
        if warnings > 0 {
            (
                format!("Conversion completed with {warnings} warnings!"),
                PROGRESS_COMPLETE,
            )
        } else {
            ("Conversion completed successfully!".to_string(), PROGRESS_COMPLETE)
        }
    } else if summary.error_count() > 0 {
        (
            format!(
                "Conversion completed with {} errors affecting {} files",
                summary.error_count(),
                summary.files_with_error_count()
            ),
            PROGRESS_FAILED,
        )
    } else {
        // Only the hierarchy write failed; every document is in place.
        (
            format!("Conversion completed with {warnings} warnings"),
            PROGRESS_COMPLETE,
        )
    }
}

/// What converting a standalone QTI file produced.
#[derive(Debug)]
pub struct QtiOutcome {
    pub documents: Vec<PathBuf>,
    pub summary: ConversionSummary,
}

/// Render a standalone QTI file to `<stem>.<ext>` and `<stem>_key.<ext>`.
///
/// Images are resolved relative to the file's directory.
pub fn convert_qti_file(
    path: &Path,
    output_dir: &Path,
    options: &ConvertOptions,
) -> Result<QtiOutcome> {
    let span = info_span!("qti", path = %path.display());
    let _guard = span.enter();

    let bytes = fs::read(path).map_err(|e| ConvertError::io(path, e))?;
    let mut summary = ConversionSummary::new();
    let source = path.display().to_string();
    let assessment = parse_assessment(&bytes, Some(&source), &mut summary).map_err(|source| {
        ConvertError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })?;

    fs::create_dir_all(output_dir).map_err(|e| ConvertError::io(output_dir, e))?;
    let assets = DirectoryAssets::new(path.parent().unwrap_or_else(|| Path::new(".")));
    let context = RenderContext::new(&options.fonts).with_assets(&assets);
    let renderer = options.renderer.as_ref();
    let stem = path
        .file_stem()
        .map_or_else(|| "assessment".to_string(), |stem| stem.to_string_lossy().into_owned());

    let mut documents = Vec::with_capacity(2);
    for (suffix, answer_key) in [("", false), ("_key", true)] {
        let bytes = renderer.render(&assessment, &context.answer_key(answer_key))?;
        let dest = output_dir.join(format!("{stem}{suffix}.{}", renderer.extension()));
        fs::write(&dest, bytes).map_err(|e| ConvertError::io(&dest, e))?;
        documents.push(dest);
    }
    info!(
        title = %assessment.title,
        items = assessment.item_count(),
        "rendered assessment"
    );

    Ok(QtiOutcome { documents, summary })
}

#[cfg(test)]
mod tests {
    use cc_model::IssueKind;

    use super::*;

    #[test]
    fn final_message_variants() {
        let mut summary = ConversionSummary::new();
        assert_eq!(
            final_message(&summary),
            ("Conversion completed successfully!".to_string(), 100.0)
        );

        summary.warning(IssueKind::MissingFile, "gone", Some("a.png"));
        assert_eq!(
            final_message(&summary),
            ("Conversion completed with 1 warnings!".to_string(), 100.0)
        );

        summary.error(IssueKind::DocxConversion, "boom", Some("q.xml"));
        summary.error(IssueKind::FileProcessing, "io", Some("q.xml"));
        assert_eq!(
            final_message(&summary),
            ("Conversion completed with 2 errors affecting 1 files".to_string(), -1.0)
        );
    }

    #[test]
    fn hierarchy_failure_alone_still_completes() {
        let mut summary = ConversionSummary::new();
        summary.set_hierarchy_error("disk full");
        let (message, progress) = final_message(&summary);
        assert_eq!(message, "Conversion completed with 0 warnings");
        assert_eq!(progress, PROGRESS_COMPLETE);
    }
}
