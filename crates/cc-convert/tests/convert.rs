//! Converting whole cartridges end to end.

mod common;

use std::fs;

use cc_convert::{
    ConvertOptions, HIERARCHY_FILE, LOOSE_FILES_DIR, NoProgress, PROGRESS_COMPLETE,
    PROGRESS_FAILED, convert_cartridge, convert_qti_file,
};
use cc_model::{IssueKind, NodeKind, OutputKind};

use common::{
    FailingRenderer, MANIFEST_NAME, document_xml, find, manifest, mc_quiz, shape, write_cartridge,
};

const COURSE: &str = r#"
    <item identifier="W1"><title>Week 1</title>
      <item identifier="I1" identifierref="Q1"><title>Quiz 1</title></item>
      <item identifier="I2" identifierref="R2"><title>Syllabus</title></item>
    </item>
    <item identifier="I3" identifierref="R3"><title>Notes</title></item>
    <item identifier="W2"><title>Week 2</title>
      <item identifier="I4" identifierref="R4"><title>Introductions</title></item>
      <item identifier="I5" identifierref="R5"><title>Course site</title></item>
    </item>
    <item identifier="I6" identifierref="R6"><title>Diagram</title></item>"#;

const RESOURCES: &[(&str, &str, &[&str])] = &[
    ("Q1", "imsqti_xmlv1p2/imscc_xmlv1p1/assessment", &["quiz1/assessment.xml"]),
    ("R2", "webcontent", &["web/syllabus.html"]),
    ("R3", "webcontent", &["web/notes.pdf"]),
    ("R4", "imsdt_xmlv1p1", &["topic/topic.xml"]),
    ("R5", "imswl_xmlv1p1", &["links/site.xml"]),
    ("R6", "webcontent", &["web/diagram.png"]),
];

fn course_files(quiz: &str) -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("quiz1/assessment.xml", quiz.as_bytes().to_vec()),
        ("web/syllabus.html", b"<html><body>Syllabus</body></html>".to_vec()),
        ("web/notes.pdf", b"%PDF-1.4".to_vec()),
        ("topic/topic.xml", b"<topic><title>Introductions</title></topic>".to_vec()),
        ("links/site.xml", b"<webLink><title>Course site</title></webLink>".to_vec()),
        ("web/diagram.png", b"not really a png".to_vec()),
    ]
}

fn entries<'a>(manifest: &'a str, files: &'a [(&'static str, Vec<u8>)]) -> Vec<(&'a str, &'a [u8])> {
    let mut entries = vec![(MANIFEST_NAME, manifest.as_bytes())];
    entries.extend(files.iter().map(|(name, bytes)| (*name, bytes.as_slice())));
    entries
}

#[test]
fn quiz_cartridge_end_to_end() {
    let dir = tempfile::tempdir().expect("temp dir");
    let manifest = manifest(COURSE, RESOURCES);
    let files = course_files(&mc_quiz("A1", "Quiz 1"));
    let path = write_cartridge(dir.path(), "course.imscc", &entries(&manifest, &files));
    let out = dir.path().join("out");

    let mut events = Vec::new();
    let mut sink = |message: &str, progress: Option<f64>| {
        events.push((message.to_string(), progress));
    };
    let outcome =
        convert_cartridge(&path, &out, &ConvertOptions::new(), &mut sink).expect("convert");

    let resource_nodes = outcome
        .hierarchy
        .walk()
        .into_iter()
        .filter(|node| node.kind == NodeKind::File)
        .count();
    assert_eq!(resource_nodes, 6);
    assert_eq!(outcome.hierarchy.children.len(), 4);
    assert!(outcome.summary.is_success(), "{:?}", outcome.summary.errors);
    assert_eq!(outcome.summary.warning_count(), 0);

    let quiz = find(&outcome.hierarchy, "I1");
    assert_eq!(quiz.path, "Week 1");
    let outputs: Vec<_> = quiz
        .files
        .iter()
        .map(|file| (file.name.as_str(), file.path.as_str(), file.kind))
        .collect();
    assert_eq!(
        outputs,
        [
            ("Quiz 1.docx", "Week 1/files/Quiz 1.docx", OutputKind::Docx),
            ("Quiz 1_key.docx", "Week 1/files/Quiz 1_key.docx", OutputKind::AnswerKey),
        ]
    );
    assert_eq!(quiz.files[1].title.as_deref(), Some("Quiz 1 (Answer Key)"));

    let files_dir = out.join("Week 1").join("files");
    assert!(files_dir.join("assessment.xml").is_file());
    assert!(!files_dir.join("assessment.docx").exists());
    assert!(document_xml(&files_dir.join("Quiz 1.docx")).contains("_____ "));
    assert!(document_xml(&files_dir.join("Quiz 1_key.docx")).contains("__B__ "));

    let topic = find(&outcome.hierarchy, "I4");
    assert_eq!(topic.files.len(), 1);
    assert_eq!(topic.files[0].kind, OutputKind::Original);
    assert_eq!(topic.files[0].path, "Week 2/files/topic.xml");
    assert!(out.join("files").join("notes.pdf").is_file());

    let json: serde_json::Value =
        serde_json::from_slice(&fs::read(out.join(HIERARCHY_FILE)).expect("read hierarchy"))
            .expect("parse hierarchy");
    assert_eq!(json["id"], "ROOT");
    assert_eq!(json["children"][0]["children"][0]["files"][0]["type"], "docx");

    let progress: Vec<f64> = events.iter().filter_map(|(_, progress)| *progress).collect();
    assert_eq!(progress.first(), Some(&0.0));
    assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(progress.iter().all(|value| *value <= PROGRESS_COMPLETE));
    assert_eq!(
        events.last(),
        Some(&("Conversion completed successfully!".to_string(), Some(PROGRESS_COMPLETE)))
    );
    assert!(events.iter().any(|(message, _)| message == "Converting assessment.xml to answer key..."));
}

#[test]
fn missing_file_is_a_single_warning() {
    let dir = tempfile::tempdir().expect("temp dir");
    let manifest = manifest(COURSE, RESOURCES);
    let mut files = course_files(&mc_quiz("A1", "Quiz 1"));
    files.retain(|(name, _)| *name != "web/notes.pdf");
    let path = write_cartridge(dir.path(), "course.imscc", &entries(&manifest, &files));

    let outcome = convert_cartridge(&path, &dir.path().join("out"), &ConvertOptions::new(), &mut NoProgress)
        .expect("convert");

    let summary = &outcome.summary;
    assert_eq!(summary.error_count(), 0);
    assert_eq!(summary.warning_count(), 1);
    let warning = &summary.warnings[0];
    assert_eq!(warning.kind, IssueKind::MissingFile);
    assert_eq!(warning.file_path.as_deref(), Some("web/notes.pdf"));
    assert!(find(&outcome.hierarchy, "I3").files.is_empty());
}

#[test]
fn tree_shape_survives_missing_resources() {
    let dir = tempfile::tempdir().expect("temp dir");
    let full_manifest = manifest(COURSE, RESOURCES);
    let files = course_files(&mc_quiz("A1", "Quiz 1"));
    let full = write_cartridge(dir.path(), "full.imscc", &entries(&full_manifest, &files));

    // Drop two resources from the manifest and two files from the archive.
    let sparse_resources: Vec<_> = RESOURCES
        .iter()
        .copied()
        .filter(|(id, _, _)| !matches!(*id, "R2" | "R5"))
        .collect();
    let sparse_manifest = manifest(COURSE, &sparse_resources);
    let mut sparse_files = files.clone();
    sparse_files.retain(|(name, _)| !matches!(*name, "quiz1/assessment.xml" | "web/diagram.png"));
    let sparse = write_cartridge(dir.path(), "sparse.imscc", &entries(&sparse_manifest, &sparse_files));

    let options = ConvertOptions::new();
    let full = convert_cartridge(&full, &dir.path().join("full"), &options, &mut NoProgress)
        .expect("convert full");
    let sparse = convert_cartridge(&sparse, &dir.path().join("sparse"), &options, &mut NoProgress)
        .expect("convert sparse");

    assert_eq!(shape(&full.hierarchy), shape(&sparse.hierarchy));
    assert_eq!(sparse.summary.warnings_of(IssueKind::MissingResource).count(), 2);
    assert_eq!(sparse.summary.warnings_of(IssueKind::MissingFile).count(), 2);
    assert!(find(&sparse.hierarchy, "I2").files.is_empty());
}

#[test]
fn render_failure_falls_back_to_original_xml() {
    let dir = tempfile::tempdir().expect("temp dir");
    let manifest = manifest(COURSE, RESOURCES);
    let files = course_files(&mc_quiz("A1", "Quiz 1"));
    let path = write_cartridge(dir.path(), "course.imscc", &entries(&manifest, &files));

    let options = ConvertOptions::new().with_renderer(FailingRenderer);
    let mut last = None;
    let mut sink = |message: &str, progress: Option<f64>| last = Some((message.to_string(), progress));
    let outcome = convert_cartridge(&path, &dir.path().join("out"), &options, &mut sink)
        .expect("convert");

    let errors: Vec<_> = outcome.summary.errors_of(IssueKind::DocxConversion).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].file_path.as_deref(), Some("quiz1/assessment.xml"));

    let quiz = find(&outcome.hierarchy, "I1");
    assert_eq!(quiz.files.len(), 1);
    assert_eq!(quiz.files[0].kind, OutputKind::Original);
    assert_eq!(quiz.files[0].name, "assessment.xml");

    assert_eq!(
        last,
        Some((
            "Conversion completed with 1 errors affecting 1 files".to_string(),
            Some(PROGRESS_FAILED)
        ))
    );
}

#[test]
fn unreferenced_resources_become_loose_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut resources = RESOURCES.to_vec();
    resources.push(("X1", "webcontent", &["extra/handout.txt"][..]));
    resources.push(("X2", "webcontent", &["extra/vanished.txt"][..]));
    let manifest = manifest(COURSE, &resources);
    let mut files = course_files(&mc_quiz("A1", "Quiz 1"));
    files.push(("extra/handout.txt", b"handout".to_vec()));
    let path = write_cartridge(dir.path(), "course.imscc", &entries(&manifest, &files));
    let out = dir.path().join("out");

    let outcome =
        convert_cartridge(&path, &out, &ConvertOptions::new(), &mut NoProgress).expect("convert");

    assert_eq!(outcome.loose_files.copied, 1);
    assert_eq!(
        fs::read(out.join(LOOSE_FILES_DIR).join("handout.txt")).expect("loose file"),
        b"handout"
    );
    let missing: Vec<_> = outcome
        .summary
        .warnings_of(IssueKind::MissingLooseFile)
        .collect();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].file_path.as_deref(), Some("extra/vanished.txt"));
    // Referenced resources are never swept.
    assert!(!out.join(LOOSE_FILES_DIR).join("syllabus.html").exists());
}

#[test]
fn hierarchy_snapshot() {
    let dir = tempfile::tempdir().expect("temp dir");
    let organization = r#"
    <item identifier="W1"><title>Week 1</title>
      <item identifier="I1" identifierref="R1"><title>Reading</title></item>
    </item>
    <item identifier="I2" identifierref="GONE"><title>Ghost</title></item>"#;
    let manifest = manifest(organization, &[("R1", "webcontent", &["docs/reading.pdf"])]);
    let path = write_cartridge(
        dir.path(),
        "small.imscc",
        &[(MANIFEST_NAME, manifest.as_bytes()), ("docs/reading.pdf", &b"%PDF"[..])],
    );

    let outcome = convert_cartridge(&path, &dir.path().join("out"), &ConvertOptions::new(), &mut NoProgress)
        .expect("convert");

    insta::assert_json_snapshot!("hierarchy", outcome.hierarchy);
}

#[test]
fn standalone_qti_file_renders_document_and_key() {
    let dir = tempfile::tempdir().expect("temp dir");
    let xml = dir.path().join("chapter3.xml");
    fs::write(&xml, mc_quiz("A1", "Chapter 3")).expect("write qti");
    let out = dir.path().join("out");

    let outcome = convert_qti_file(&xml, &out, &ConvertOptions::new()).expect("convert");

    assert_eq!(
        outcome.documents,
        [out.join("chapter3.docx"), out.join("chapter3_key.docx")]
    );
    assert!(document_xml(&outcome.documents[1]).contains("__B__ "));
    assert!(outcome.summary.is_success());
}

#[test]
fn standalone_non_qti_file_is_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    let xml = dir.path().join("topic.xml");
    fs::write(&xml, "<topic/>").expect("write xml");

    let err = convert_qti_file(&xml, &dir.path().join("out"), &ConvertOptions::new()).unwrap_err();
    assert!(matches!(err, cc_convert::ConvertError::Parse { .. }));
}
