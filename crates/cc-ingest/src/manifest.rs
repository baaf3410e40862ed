//! `imsmanifest.xml` extraction: resource registry, organization tree, and
//! the set of resources the organization references.

use cc_model::{
    DEFAULT_COURSE_TITLE, ManifestResource, OrganizationItem, ReferencedSet, ResourceRegistry,
    UNTITLED_ITEM,
};

use crate::error::ParserError;
use crate::xml::{XmlElement, parse_document};

/// Identifier of the synthetic root used when a manifest has no organization.
pub const SYNTHETIC_ROOT_ID: &str = "root";

/// Namespace suffix of the manifest-level LOM metadata that holds the course title.
const LOM_MANIFEST_SUFFIX: &str = "/LOM/manifest";

/// Everything the pipeline needs from a manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub course_title: String,
    pub resources: ResourceRegistry,
    /// Root of the organization tree; its title is the course title.
    pub organization: OrganizationItem,
    pub referenced: ReferencedSet,
}

/// Parse manifest bytes.
///
/// Only malformed XML is fatal. Missing sections produce an empty registry
/// or a childless synthetic root.
pub fn parse_manifest(bytes: &[u8]) -> Result<Manifest, ParserError> {
    let root = parse_document(bytes)?;
    let package = PackageScope::new(&root);

    let course_title = course_title(&root);
    let resources = package
        .find(&root, "resources")
        .map(|element| parse_resources(&package, element))
        .unwrap_or_default();
    let referenced = package
        .find(&root, "organizations")
        .or_else(|| package.find(&root, "organization"))
        .map(referenced_set)
        .unwrap_or_default();
    let organization = organization_tree(&package, &root, &course_title);

    tracing::debug!(
        title = %course_title,
        resources = resources.len(),
        referenced = referenced.len(),
        nodes = organization.descendant_count(),
        "parsed manifest"
    );

    Ok(Manifest {
        course_title,
        resources,
        organization,
        referenced,
    })
}

/// Element lookup scoped to the manifest's own namespace.
///
/// Elements in the root's namespace are preferred; unqualified elements
/// are accepted when none match, for manifests written without one.
struct PackageScope<'a> {
    namespace: Option<&'a str>,
}

impl<'a> PackageScope<'a> {
    fn new(root: &'a XmlElement) -> Self {
        Self {
            namespace: root.namespace(),
        }
    }

    fn accepts(&self, element: &XmlElement, name: &str) -> bool {
        element.is_named(name) && element.namespace() == self.namespace
    }

    fn find<'e>(&self, scope: &'e XmlElement, name: &str) -> Option<&'e XmlElement> {
        let descendants = scope.descendants();
        descendants
            .iter()
            .find(|element| self.accepts(element, name))
            .or_else(|| {
                descendants
                    .iter()
                    .find(|element| element.is_named(name) && element.namespace().is_none())
            })
            .copied()
    }

    fn find_all<'e>(&self, scope: &'e XmlElement, name: &str) -> Vec<&'e XmlElement> {
        scope
            .descendants()
            .into_iter()
            .filter(|element| {
                element.is_named(name)
                    && (element.namespace() == self.namespace || element.namespace().is_none())
            })
            .collect()
    }
}

fn course_title(root: &XmlElement) -> String {
    let descendants = root.descendants();
    let lom = descendants.iter().find_map(|element| {
        let in_lom = element
            .namespace()
            .is_some_and(|ns| ns.ends_with(LOM_MANIFEST_SUFFIX));
        if !(element.is_named("title") && in_lom) {
            return None;
        }
        let string = element
            .children_named("string")
            .find(|child| child.namespace() == element.namespace())?;
        non_empty(string.trimmed_text())
    });

    lom.or_else(|| {
        descendants.iter().find_map(|element| {
            if !(element.is_named("title") && element.namespace().is_none()) {
                return None;
            }
            let string = element
                .children_named("string")
                .find(|child| child.namespace().is_none())?;
            non_empty(string.trimmed_text())
        })
    })
    .unwrap_or_else(|| DEFAULT_COURSE_TITLE.to_string())
}

fn parse_resources(package: &PackageScope<'_>, resources: &XmlElement) -> ResourceRegistry {
    let mut registry = ResourceRegistry::new();
    for element in package.find_all(resources, "resource") {
        let Some(identifier) = element.non_empty_attr("identifier") else {
            tracing::debug!("skipping resource without identifier");
            continue;
        };
        let mut resource = ManifestResource::new(identifier, element.attr("type").unwrap_or(""))
            .with_href(element.attr("href").unwrap_or(""));
        for file in package.find_all(element, "file") {
            if let Some(href) = file.non_empty_attr("href") {
                resource = resource.with_file(href);
            }
        }
        registry.insert(resource);
    }
    registry
}

fn referenced_set(organizations: &XmlElement) -> ReferencedSet {
    organizations
        .find_all("item")
        .into_iter()
        .filter_map(|item| item.non_empty_attr("identifierref"))
        .map(str::to_string)
        .collect()
}

fn organization_tree(
    package: &PackageScope<'_>,
    root: &XmlElement,
    course_title: &str,
) -> OrganizationItem {
    let synthetic = || OrganizationItem::container(SYNTHETIC_ROOT_ID, course_title);

    let Some(organization) = package.find(root, "organization") else {
        tracing::debug!("manifest has no organization");
        return synthetic();
    };
    let Some(root_item) = organization
        .child("item")
        .or_else(|| package.find(organization, "item"))
    else {
        return synthetic();
    };

    let mut tree = parse_item(root_item);
    tree.title = course_title.to_string();
    tree
}

/// Build an organization node from an `<item>`, recursing into direct
/// `<item>` children only.
fn parse_item(element: &XmlElement) -> OrganizationItem {
    let title = element
        .child("title")
        .and_then(|title| non_empty(title.trimmed_text()))
        .unwrap_or_else(|| UNTITLED_ITEM.to_string());

    OrganizationItem {
        identifier: element.attr("identifier").unwrap_or_default().to_string(),
        title,
        identifierref: element.non_empty_attr("identifierref").map(str::to_string),
        children: element.children_named("item").map(parse_item).collect(),
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}
