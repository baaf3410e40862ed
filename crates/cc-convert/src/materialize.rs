//! Writing the organization tree to disk.
//!
//! Containers become directories named after their sanitized title.
//! Resource items copy their files into the parent directory's `files/`
//! and render correlated assessments next to them.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use cc_ingest::{CartridgeArchive, IngestError, Manifest};
use cc_model::{
    Assessment, HierarchyNode, IssueKind, OrganizationItem, OutputFileRef, OutputKind, file_name,
    is_xml_path, sanitize_filename,
};
use cc_render::{DocumentRenderer, FontMap, RenderContext};

use crate::correlate::Correlation;
use crate::error::{ConvertError, Result};
use crate::progress::{ByteProgress, Reporter};

/// Directory, under each container, that holds resource files.
pub const FILES_DIR: &str = "files";

/// Identifiers of resources copied while walking the organization.
pub type ProcessedSet = BTreeSet<String>;

/// Everything the walk reads.
#[derive(Clone, Copy)]
pub struct MaterializeInput<'a> {
    pub archive: &'a CartridgeArchive,
    pub manifest: &'a Manifest,
    pub correlation: &'a Correlation<'a>,
    pub renderer: &'a dyn DocumentRenderer,
    pub fonts: &'a FontMap,
}

#[derive(Debug)]
pub struct Materialized {
    pub hierarchy: HierarchyNode,
    pub processed: ProcessedSet,
}

/// Walk the organization tree, writing under `output_root`.
///
/// The returned tree has one node per organization node, whether or not
/// its resource could be found or copied.
pub fn materialize(
    input: &MaterializeInput<'_>,
    output_root: &Path,
    reporter: &mut Reporter<'_>,
) -> Materialized {
    let total = input
        .correlation
        .iter()
        .filter_map(|(path, _)| input.archive.size(path))
        .sum();
    let mut walk = Walk {
        input,
        reporter,
        processed: ProcessedSet::new(),
        progress: ByteProgress::new(total),
    };
    if walk.progress.total() > 0 {
        let message = format!(
            "Starting {} conversion of {} XML files...",
            input.renderer.extension().to_uppercase(),
            input.correlation.len()
        );
        walk.reporter.progress(&message, Some(0.0));
    }

    let organization = &input.manifest.organization;
    let mut root = HierarchyNode::folder(&organization.identifier, &organization.title, "");
    for child in &organization.children {
        root.children.push(walk.item(child, output_root, ""));
    }

    Materialized {
        hierarchy: root,
        processed: walk.processed,
    }
}

struct Walk<'w, 'r> {
    input: &'w MaterializeInput<'w>,
    reporter: &'w mut Reporter<'r>,
    processed: ProcessedSet,
    progress: ByteProgress,
}

impl Walk<'_, '_> {
    fn item(&mut self, item: &OrganizationItem, dir: &Path, rel: &str) -> HierarchyNode {
        match item.identifierref.as_deref() {
            Some(reference) => self.resource_item(item, reference, dir, rel),
            None => self.container(item, dir, rel),
        }
    }

    fn container(&mut self, item: &OrganizationItem, parent: &Path, parent_rel: &str) -> HierarchyNode {
        let name = sanitize_filename(&item.title);
        let dir = parent.join(&name);
        let rel = join_rel(parent_rel, &name);
        if let Err(error) = fs::create_dir_all(&dir) {
            self.reporter.error(
                IssueKind::FileProcessing,
                format!("Could not create directory {}: {error}", dir.display()),
                None,
            );
        }

        let mut node = HierarchyNode::folder(&item.identifier, &item.title, &rel);
        for child in &item.children {
            node.children.push(self.item(child, &dir, &rel));
        }
        node
    }

    fn resource_item(
        &mut self,
        item: &OrganizationItem,
        reference: &str,
        dir: &Path,
        rel: &str,
    ) -> HierarchyNode {
        let mut node = HierarchyNode::file(&item.identifier, &item.title, rel);
        let Some(resource) = self.input.manifest.resources.get(reference) else {
            self.reporter.warning(
                IssueKind::MissingResource,
                format!("Resource {reference} not found"),
                None,
            );
            return node;
        };
        self.processed.insert(reference.to_string());

        let files_dir = dir.join(FILES_DIR);
        let files_rel = join_rel(rel, FILES_DIR);
        for file_path in &resource.files {
            if !self.input.archive.contains(file_path) {
                self.reporter.warning(
                    IssueKind::MissingFile,
                    format!("Resource file {file_path} referenced in manifest but not found in archive"),
                    Some(file_path),
                );
                continue;
            }
            match self.copy_file(file_path, &files_dir, &files_rel) {
                Ok(files) => node.files.extend(files),
                Err(error) => self.reporter.error(
                    IssueKind::FileProcessing,
                    format!("Could not process file {file_path}: {error}"),
                    Some(file_path),
                ),
            }
        }
        node
    }

    /// Copy one archive file and, for a correlated assessment, render it.
    ///
    /// A failed render keeps the copied XML as the item's output.
    fn copy_file(
        &mut self,
        file_path: &str,
        files_dir: &Path,
        files_rel: &str,
    ) -> Result<Vec<OutputFileRef>> {
        let bytes = self
            .input
            .archive
            .read(file_path)
            .map_err(IngestError::from)?
            .unwrap_or_default();
        fs::create_dir_all(files_dir).map_err(|e| ConvertError::io(files_dir, e))?;
        let name = file_name(file_path);
        let dest = files_dir.join(name);
        fs::write(&dest, &bytes).map_err(|e| ConvertError::io(&dest, e))?;
        tracing::debug!(file = file_path, dest = %dest.display(), "copied resource file");

        let original = OutputFileRef::new(name, join_rel(files_rel, name), OutputKind::Original);
        let assessment = match self.input.correlation.get(file_path) {
            Some(assessment) if is_xml_path(file_path) => assessment,
            _ => return Ok(vec![original]),
        };

        match self.render(assessment, file_path, files_dir, files_rel) {
            Ok(files) => Ok(files),
            Err(error) => {
                self.reporter.error(
                    IssueKind::DocxConversion,
                    format!("Could not convert XML file {file_path}: {error}"),
                    Some(file_path),
                );
                Ok(vec![original])
            }
        }
    }

    fn render(
        &mut self,
        assessment: &Assessment,
        file_path: &str,
        files_dir: &Path,
        files_rel: &str,
    ) -> Result<Vec<OutputFileRef>> {
        let renderer = self.input.renderer;
        let extension = renderer.extension();
        let context = RenderContext::new(self.input.fonts).with_assets(self.input.archive);
        let document = renderer.render(assessment, &context)?;
        let key = renderer.render(assessment, &context.answer_key(true))?;

        let stem = sanitize_filename(&assessment.title);
        let size = self.input.archive.size(file_path).unwrap_or(0);
        let source_name = file_name(file_path);
        let label = extension.to_uppercase();
        let mut files = Vec::with_capacity(2);

        let document_name = format!("{stem}.{extension}");
        write_output(files_dir, &document_name, &document)?;
        files.push(
            OutputFileRef::new(&document_name, join_rel(files_rel, &document_name), OutputKind::Docx)
                .with_title(&assessment.title),
        );
        let progress = self.progress.credit(size / 2);
        self.reporter.progress(
            &format!("Converting {source_name} to {label}..."),
            Some(progress),
        );

        let key_name = format!("{stem}_key.{extension}");
        write_output(files_dir, &key_name, &key)?;
        files.push(
            OutputFileRef::new(&key_name, join_rel(files_rel, &key_name), OutputKind::AnswerKey)
                .with_title(format!("{} (Answer Key)", assessment.title)),
        );
        let progress = self.progress.credit(size - size / 2);
        self.reporter.progress(
            &format!("Converting {source_name} to answer key..."),
            Some(progress),
        );

        Ok(files)
    }
}

fn write_output(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, bytes).map_err(|e| ConvertError::io(&path, e))
}

/// `/`-joined path relative to the output root.
pub(crate) fn join_rel(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}
