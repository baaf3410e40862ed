//! Manifest-level records: resources and the organization tree.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Title used when the manifest carries no course title.
pub const DEFAULT_COURSE_TITLE: &str = "Course Content";

/// Title used for organization items without a `<title>`.
pub const UNTITLED_ITEM: &str = "Untitled";

/// A `<resource>` declared in `imsmanifest.xml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestResource {
    pub identifier: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub href: String,
    /// `<file href>` entries in document order.
    pub files: Vec<String>,
}

impl ManifestResource {
    pub fn new(identifier: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            resource_type: resource_type.into(),
            href: String::new(),
            files: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = href.into();
        self
    }

    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.files.push(file.into());
        self
    }

    /// First `.xml` file of the resource, if any.
    pub fn first_xml_file(&self) -> Option<&str> {
        self.files
            .iter()
            .map(String::as_str)
            .find(|file| is_xml_path(file))
    }
}

/// Resources keyed by identifier, iterated in manifest order.
///
/// A duplicate identifier replaces the earlier record but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceRegistry {
    resources: Vec<ManifestResource>,
    index: BTreeMap<String, usize>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource: ManifestResource) {
        match self.index.get(&resource.identifier) {
            Some(&position) => self.resources[position] = resource,
            None => {
                self.index
                    .insert(resource.identifier.clone(), self.resources.len());
                self.resources.push(resource);
            }
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&ManifestResource> {
        self.index
            .get(identifier)
            .map(|&position| &self.resources[position])
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.index.contains_key(identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestResource> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl FromIterator<ManifestResource> for ResourceRegistry {
    fn from_iter<T: IntoIterator<Item = ManifestResource>>(iter: T) -> Self {
        let mut registry = Self::new();
        for resource in iter {
            registry.insert(resource);
        }
        registry
    }
}

/// Every `identifierref` found anywhere in the organization.
pub type ReferencedSet = BTreeSet<String>;

/// A node of the manifest's `<organization>` tree.
///
/// Nodes with an `identifierref` are leaves pointing at a resource; nodes
/// without one are containers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationItem {
    pub identifier: String,
    pub title: String,
    pub identifierref: Option<String>,
    pub children: Vec<OrganizationItem>,
}

impl OrganizationItem {
    pub fn container(identifier: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            identifierref: None,
            children: Vec::new(),
        }
    }

    pub fn leaf(
        identifier: impl Into<String>,
        title: impl Into<String>,
        identifierref: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            identifierref: Some(identifierref.into()),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_child(mut self, child: OrganizationItem) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.identifierref.is_some()
    }

    /// Number of nodes below this one.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }
}

/// True when `path` names an XML file (case-insensitive extension).
pub fn is_xml_path(path: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("xml"))
}

/// Final component of an archive path (`a/b/c.xml` -> `c.xml`).
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
