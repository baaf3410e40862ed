//! Cartridge fixtures built in memory.

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use cc_model::{Assessment, HierarchyNode, NodeKind};
use cc_render::{DocumentRenderer, RenderContext, RenderError};
use zip::write::SimpleFileOptions;

pub const MANIFEST_NAME: &str = "imsmanifest.xml";

pub fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in files {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start file");
        writer.write_all(contents).expect("write file");
    }
    writer.finish().expect("finish zip").into_inner()
}

pub fn write_cartridge(dir: &Path, name: &str, files: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, zip_bytes(files)).expect("write cartridge");
    path
}

/// A one-question multiple-choice quiz with options A, B, C; B is correct.
pub fn mc_quiz(ident: &str, title: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<questestinterop xmlns="http://www.imsglobal.org/xsd/ims_qtiasiv1p2">
  <assessment ident="{ident}" title="{title}">
    <section ident="root_section">
      <item ident="{ident}_q1" title="Question 1">
        <itemmetadata><qtimetadata>
          <qtimetadatafield><fieldlabel>cc_profile</fieldlabel><fieldentry>cc.multiple_choice.v0p1</fieldentry></qtimetadatafield>
        </qtimetadata></itemmetadata>
        <presentation>
          <material><mattext texttype="text/html">&lt;p&gt;Which organelle makes ATP?&lt;/p&gt;</mattext></material>
          <response_lid ident="response1" rcardinality="Single">
            <render_choice>
              <response_label ident="A"><material><mattext>Nucleus</mattext></material></response_label>
              <response_label ident="B"><material><mattext>Mitochondria</mattext></material></response_label>
              <response_label ident="C"><material><mattext>Ribosome</mattext></material></response_label>
            </render_choice>
          </response_lid>
        </presentation>
        <resprocessing>
          <respcondition continue="No">
            <conditionvar><varequal respident="response1">B</varequal></conditionvar>
            <setvar action="Set" varname="SCORE">100</setvar>
          </respcondition>
        </resprocessing>
      </item>
    </section>
  </assessment>
</questestinterop>"#
    )
}

/// A manifest from an organization body and `(identifier, type, files)` resources.
pub fn manifest(organization: &str, resources: &[(&str, &str, &[&str])]) -> String {
    let resources: String = resources
        .iter()
        .map(|(identifier, kind, files)| {
            let files: String = files
                .iter()
                .map(|href| format!(r#"<file href="{href}"/>"#))
                .collect();
            format!(r#"<resource identifier="{identifier}" type="{kind}">{files}</resource>"#)
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest identifier="M" xmlns="http://www.imsglobal.org/xsd/imsccv1p1/imscp_v1p1">
  <organizations><organization identifier="ORG" structure="rooted-hierarchy">
    <item identifier="ROOT">{organization}</item>
  </organization></organizations>
  <resources>{resources}</resources>
</manifest>"#
    )
}

/// Every node's kind and child count, depth first.
pub fn shape(node: &HierarchyNode) -> Vec<(NodeKind, usize)> {
    node.walk()
        .into_iter()
        .map(|node| (node.kind, node.children.len()))
        .collect()
}

pub fn find<'a>(node: &'a HierarchyNode, id: &str) -> &'a HierarchyNode {
    node.walk()
        .into_iter()
        .find(|node| node.id == id)
        .unwrap_or_else(|| panic!("no node {id}"))
}

/// `word/document.xml` of a rendered document.
pub fn document_xml(path: &Path) -> String {
    let bytes = std::fs::read(path).expect("read docx");
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("open docx");
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .expect("document.xml")
        .read_to_string(&mut xml)
        .expect("read document.xml");
    xml
}

/// A renderer that always fails.
pub struct FailingRenderer;

impl DocumentRenderer for FailingRenderer {
    fn extension(&self) -> &'static str {
        "docx"
    }

    fn render(&self, _: &Assessment, _: &RenderContext<'_>) -> cc_render::Result<Vec<u8>> {
        Err(RenderError::Pack("renderer unavailable".to_string()))
    }
}
