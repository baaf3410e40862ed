//! Output tree written alongside the converted cartridge as `hierarchy.json`.

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Docx,
    AnswerKey,
    Original,
}

/// A file produced for one resource item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputFileRef {
    pub name: String,
    /// Path relative to the cartridge output root, `/`-separated.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: OutputKind,
    #[serde(serialize_with = "empty_if_none")]
    pub title: Option<String>,
}

impl OutputFileRef {
    pub fn new(name: impl Into<String>, path: impl Into<String>, kind: OutputKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind,
            title: None,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A node of the materialized output tree.
///
/// The shape always follows the organization tree; only `files` depends on
/// what could actually be copied and rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyNode {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HierarchyNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<OutputFileRef>,
}

impl HierarchyNode {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        kind: NodeKind,
        path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            path: path.into(),
            children: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn folder(id: impl Into<String>, title: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(id, title, NodeKind::Folder, path)
    }

    pub fn file(id: impl Into<String>, title: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(id, title, NodeKind::File, path)
    }

    /// Number of nodes below this one.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }

    /// Depth-first iterator over every node, this one included.
    pub fn walk(&self) -> Vec<&HierarchyNode> {
        let mut nodes = vec![self];
        for child in &self.children {
            nodes.extend(child.walk());
        }
        nodes
    }

    /// All output files in depth-first order.
    pub fn all_files(&self) -> Vec<&OutputFileRef> {
        self.walk()
            .into_iter()
            .flat_map(|node| node.files.iter())
            .collect()
    }
}

fn empty_if_none<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or(""))
}
