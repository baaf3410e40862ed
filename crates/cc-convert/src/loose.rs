//! Copying resources the organization never reaches.

use std::fs;
use std::path::{Path, PathBuf};

use cc_ingest::{CartridgeArchive, IngestError, Manifest};
use cc_model::{IssueKind, file_name};

use crate::error::{ConvertError, Result};
use crate::materialize::ProcessedSet;
use crate::options::{LOOSE_FILES_DIR, LoosePlacement};
use crate::progress::Reporter;

/// Result of the loose-file sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LooseFiles {
    /// Directory the files went to; `None` when nothing was copied.
    pub dir: Option<PathBuf>,
    pub copied: usize,
}

/// Copy the files of every resource that is neither referenced by the
/// organization nor already processed.
///
/// The destination directory is created on the first copy.
pub fn copy_loose_files(
    archive: &CartridgeArchive,
    manifest: &Manifest,
    processed: &ProcessedSet,
    output_root: &Path,
    placement: &LoosePlacement,
    reporter: &mut Reporter<'_>,
) -> LooseFiles {
    let (dir, prefix) = match placement {
        LoosePlacement::Private => (output_root.join(LOOSE_FILES_DIR), None),
        LoosePlacement::Shared { dir, prefix } => (dir.clone(), Some(prefix.as_str())),
    };
    let mut result = LooseFiles::default();

    let loose = manifest.resources.iter().filter(|resource| {
        !manifest.referenced.contains(&resource.identifier)
            && !processed.contains(&resource.identifier)
    });
    for resource in loose {
        for file_path in &resource.files {
            if !archive.contains(file_path) {
                reporter.warning(
                    IssueKind::MissingLooseFile,
                    format!("Loose file {file_path} referenced in manifest but not found in archive"),
                    Some(file_path),
                );
                continue;
            }
            let name = match prefix {
                Some(prefix) => format!("{prefix}_{}", file_name(file_path)),
                None => file_name(file_path).to_string(),
            };
            match copy_one(archive, file_path, &dir, &name) {
                Ok(()) => {
                    result.dir.get_or_insert_with(|| dir.clone());
                    result.copied += 1;
                }
                Err(error) => reporter.error(
                    IssueKind::LooseFileCopy,
                    format!("Could not copy unreferenced file {file_path}: {error}"),
                    Some(file_path),
                ),
            }
        }
    }

    if result.copied > 0 {
        tracing::info!(count = result.copied, dir = %dir.display(), "copied loose files");
    }
    result
}

fn copy_one(archive: &CartridgeArchive, file_path: &str, dir: &Path, name: &str) -> Result<()> {
    let bytes = archive
        .read(file_path)
        .map_err(IngestError::from)?
        .unwrap_or_default();
    fs::create_dir_all(dir).map_err(|e| ConvertError::io(dir, e))?;
    let dest = dir.join(name);
    fs::write(&dest, bytes).map_err(|e| ConvertError::io(&dest, e))
}
