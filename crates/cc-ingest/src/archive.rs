//! Read-only access to a cartridge's zip archive.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;
use std::sync::Mutex;

use cc_model::is_xml_path;
use zip::ZipArchive;

use crate::error::ArchiveError;

/// Name of the manifest every cartridge carries at its root.
pub const MANIFEST_NAME: &str = "imsmanifest.xml";

trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// A file stored in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    /// Uncompressed size in bytes.
    pub size: u64,
}

/// An opened `.imscc` archive.
///
/// The central directory is listed once at open time; entry order is the
/// order the files were stored in, which is what correlation relies on
/// for determinism.
pub struct CartridgeArchive {
    label: String,
    zip: Mutex<ZipArchive<Box<dyn ReadSeek>>>,
    entries: Vec<ArchiveEntry>,
    index: BTreeMap<String, usize>,
}

impl std::fmt::Debug for CartridgeArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartridgeArchive")
            .field("label", &self.label)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl CartridgeArchive {
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let file = File::open(path).map_err(|source| ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(Box::new(BufReader::new(file)), path.display().to_string())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ArchiveError> {
        Self::from_reader(Box::new(Cursor::new(bytes)), "<memory>".to_string())
    }

    fn from_reader(reader: Box<dyn ReadSeek>, label: String) -> Result<Self, ArchiveError> {
        let mut zip = ZipArchive::new(reader).map_err(|source| ArchiveError::Zip {
            label: label.clone(),
            source,
        })?;

        let mut entries = Vec::with_capacity(zip.len());
        let mut index = BTreeMap::new();
        for i in 0..zip.len() {
            let file = zip.by_index_raw(i).map_err(|source| ArchiveError::Zip {
                label: label.clone(),
                source,
            })?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            index.entry(name.clone()).or_insert(entries.len());
            entries.push(ArchiveEntry {
                name,
                size: file.size(),
            });
        }

        if !index.contains_key(MANIFEST_NAME) {
            return Err(ArchiveError::MissingManifest { label });
        }

        tracing::debug!(archive = %label, entries = entries.len(), "opened cartridge archive");
        Ok(Self {
            label,
            zip: Mutex::new(zip),
            entries,
            index,
        })
    }

    /// Path or description the archive was opened from.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn size(&self, name: &str) -> Option<u64> {
        self.index.get(name).map(|&i| self.entries[i].size)
    }

    /// XML entries other than the manifest, in archive order.
    pub fn xml_entries(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.name != MANIFEST_NAME && is_xml_path(&entry.name))
    }

    /// Read an entry's bytes. `Ok(None)` when no such entry exists.
    pub fn read(&self, name: &str) -> Result<Option<Vec<u8>>, ArchiveError> {
        if !self.contains(name) {
            return Ok(None);
        }
        let mut zip = self.zip.lock().map_err(|_| ArchiveError::Poisoned)?;
        let mut file = zip.by_name(name).map_err(|e| ArchiveError::Entry {
            name: name.to_string(),
            message: e.to_string(),
        })?;
        let capacity = usize::try_from(file.size()).unwrap_or(0);
        let mut bytes = Vec::with_capacity(capacity);
        file.read_to_end(&mut bytes)
            .map_err(|e| ArchiveError::Entry {
                name: name.to_string(),
                message: e.to_string(),
            })?;
        Ok(Some(bytes))
    }

    pub fn read_manifest(&self) -> Result<Vec<u8>, ArchiveError> {
        self.read(MANIFEST_NAME)?
            .ok_or_else(|| ArchiveError::MissingManifest {
                label: self.label.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;

    fn build(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in files {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("start file");
            writer.write_all(bytes).expect("write file");
        }
        writer.finish().expect("finish zip").into_inner()
    }

    #[test]
    fn lists_entries_in_archive_order() {
        let bytes = build(&[
            (MANIFEST_NAME, b"<manifest/>"),
            ("b/quiz.xml", b"<questestinterop/>"),
            ("a/notes.txt", b"hello"),
            ("a/quiz.XML", b"<questestinterop/>"),
        ]);
        let archive = CartridgeArchive::from_bytes(bytes).expect("open archive");

        let names: Vec<_> = archive.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            [MANIFEST_NAME, "b/quiz.xml", "a/notes.txt", "a/quiz.XML"]
        );
        let xml: Vec<_> = archive.xml_entries().map(|e| e.name.as_str()).collect();
        assert_eq!(xml, ["b/quiz.xml", "a/quiz.XML"]);
        assert_eq!(archive.size("a/notes.txt"), Some(5));
    }

    #[test]
    fn reads_present_and_absent_entries() {
        let bytes = build(&[(MANIFEST_NAME, b"<manifest/>"), ("img.png", b"png")]);
        let archive = CartridgeArchive::from_bytes(bytes).expect("open archive");

        assert_eq!(archive.read("img.png").unwrap().as_deref(), Some(&b"png"[..]));
        assert!(archive.read("nope.png").unwrap().is_none());
        assert_eq!(archive.read_manifest().unwrap(), b"<manifest/>");
    }

    #[test]
    fn rejects_archive_without_manifest() {
        let bytes = build(&[("quiz.xml", b"<questestinterop/>")]);
        let err = CartridgeArchive::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, ArchiveError::MissingManifest { .. }));
    }

    #[test]
    fn rejects_non_zip_input() {
        let err = CartridgeArchive::from_bytes(b"not a zip".to_vec()).unwrap_err();
        assert!(matches!(err, ArchiveError::Zip { .. }));
    }

    #[test]
    fn opens_from_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("course.imscc");
        std::fs::write(&path, build(&[(MANIFEST_NAME, b"<manifest/>")])).expect("write zip");

        let archive = CartridgeArchive::open(&path).expect("open archive");
        assert_eq!(archive.entries().len(), 1);
        assert!(archive.label().ends_with("course.imscc"));
    }
}
