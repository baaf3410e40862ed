//! Run reports built from real conversions.

use std::io::{Cursor, Write};
use std::path::Path;

use cc_cli::summary::kind_counts;
use cc_cli::types::{RunKind, RunReport};
use cc_convert::{ConvertOptions, NoProgress, convert_cartridge, convert_session};
use zip::write::SimpleFileOptions;

const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest identifier="M" xmlns="http://www.imsglobal.org/xsd/imsccv1p1/imscp_v1p1">
  <organizations><organization identifier="ORG" structure="rooted-hierarchy">
    <item identifier="ROOT">
      <item identifier="I1" identifierref="R1"><title>Handout</title></item>
      <item identifier="I2" identifierref="R2"><title>Slides</title></item>
    </item>
  </organization></organizations>
  <resources>
    <resource identifier="R1" type="webcontent"><file href="handout.txt"/></resource>
    <resource identifier="R2" type="webcontent"><file href="slides.pdf"/></resource>
  </resources>
</manifest>"#;

fn write_cartridge(dir: &Path, name: &str) -> std::path::PathBuf {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (file, contents) in [("imsmanifest.xml", MANIFEST.as_bytes()), ("handout.txt", &b"notes"[..])] {
        writer
            .start_file(file, SimpleFileOptions::default())
            .expect("start file");
        writer.write_all(contents).expect("write file");
    }
    let bytes = writer.finish().expect("finish zip").into_inner();
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write cartridge");
    path
}

#[test]
fn warnings_alone_do_not_fail_the_run() {
    let input = tempfile::tempdir().expect("tempdir");
    let output = tempfile::tempdir().expect("tempdir");
    let cartridge = write_cartridge(input.path(), "course.imscc");

    let outcome = convert_cartridge(
        &cartridge,
        output.path(),
        &ConvertOptions::new(),
        &mut NoProgress,
    )
    .expect("convert");
    let report = RunReport::from_cartridge(cartridge.clone(), outcome);

    assert_eq!(report.kind, RunKind::Cartridge);
    assert!(!report.has_errors());
    assert_eq!(report.message.0, "Conversion completed with 1 warnings!");
    assert_eq!(report.message.1, 100.0);
    let counts = kind_counts(&report.summary);
    assert_eq!(counts["missing_file"].warnings, 1);
}

#[test]
fn session_report_lists_cartridges() {
    let input = tempfile::tempdir().expect("tempdir");
    let output = tempfile::tempdir().expect("tempdir");
    write_cartridge(input.path(), "beta.imscc");
    write_cartridge(input.path(), "alpha.imscc");
    std::fs::write(input.path().join("broken.imscc"), b"not a zip").expect("write");

    let outcome = convert_session(
        input.path(),
        output.path(),
        &ConvertOptions::new(),
        &mut NoProgress,
    )
    .expect("session");
    let report = RunReport::from_session(
        input.path().to_path_buf(),
        output.path().to_path_buf(),
        outcome,
    );

    assert_eq!(
        report.kind,
        RunKind::Session {
            cartridges: vec!["alpha".to_string(), "beta".to_string()]
        }
    );
    assert!(report.has_errors());
    assert_eq!(kind_counts(&report.summary)["cartridge"].errors, 1);
    assert_eq!(report.message.1, -1.0);
}
