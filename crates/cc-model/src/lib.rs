//! Data model shared by every stage of the cartridge converter.

pub mod assessment;
pub mod hierarchy;
pub mod manifest;
pub mod sanitize;
pub mod summary;

pub use assessment::{
    Assessment, ImageInfo, Item, QuestionType, ResponseOption, Section, TextContent, TextRun,
    TextStyle, UNTITLED_ASSESSMENT, plain_text,
};
pub use hierarchy::{HierarchyNode, NodeKind, OutputFileRef, OutputKind};
pub use manifest::{
    DEFAULT_COURSE_TITLE, ManifestResource, OrganizationItem, ReferencedSet, ResourceRegistry,
    UNTITLED_ITEM, file_name, is_xml_path,
};
pub use sanitize::{UNTITLED, sanitize_filename};
pub use summary::{ConversionSummary, Issue, IssueKind, IssueSeverity};
