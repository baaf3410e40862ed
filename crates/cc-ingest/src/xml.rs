//! Minimal namespace-aware XML tree.
//!
//! Manifests and QTI documents are small, and both extractors walk them
//! non-linearly (first descendant, direct children, sibling lookups), so
//! the document is read once with [`NsReader`] into an owned tree.

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;

use crate::error::ParserError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// Local name, without prefix.
    pub name: String,
    /// Resolved namespace URI, `None` when the element is unqualified.
    pub namespace: Option<String>,
    /// Attributes by local name. Namespace declarations are dropped.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    fn new(name: String, namespace: Option<String>) -> Self {
        Self {
            name,
            namespace,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute value, treating an empty value as absent.
    pub fn non_empty_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|value| !value.is_empty())
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Direct child elements.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// Direct child elements with the given local name.
    pub fn children_named<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |element| element.is_named(name))
    }

    /// First direct child with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children_named(name).next()
    }

    /// All descendant elements in document order, excluding `self`.
    pub fn descendants(&self) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        let mut stack: Vec<&XmlElement> = self.elements().collect();
        stack.reverse();
        while let Some(element) = stack.pop() {
            out.push(element);
            let mut children: Vec<&XmlElement> = element.elements().collect();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// First descendant with the given local name.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        self.descendants()
            .into_iter()
            .find(|element| element.is_named(name))
    }

    pub fn find_all(&self, name: &str) -> Vec<&XmlElement> {
        self.descendants()
            .into_iter()
            .filter(|element| element.is_named(name))
            .collect()
    }

    /// Concatenated direct text content, CDATA included.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) => Some(text.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Direct text content with surrounding whitespace removed.
    pub fn trimmed_text(&self) -> String {
        self.text().trim().to_string()
    }

    fn push_text(&mut self, text: &str) {
        if let Some(XmlNode::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(XmlNode::Text(text.to_string()));
        }
    }
}

/// Parse a complete document and return its root element.
pub fn parse_document(bytes: &[u8]) -> Result<XmlElement, ParserError> {
    let mut reader = NsReader::from_reader(bytes);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let next = reader
            .read_resolved_event()
            .map(|(resolved, event)| (owned_namespace(&resolved), event));
        let (namespace, event) = match next {
            Ok(next) => next,
            Err(e) => return Err(xml_error(&reader, e)),
        };

        match event {
            Event::Start(start) => {
                let element = open_element(&reader, namespace, &start)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open_element(&reader, namespace, &start)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Text(text) => {
                let decoded = reader
                    .decoder()
                    .decode(&text)
                    .map_err(|e| encoding_error(&reader, e))?;
                append_text(&mut stack, &decoded);
            }
            Event::CData(data) => {
                let decoded = reader
                    .decoder()
                    .decode(&data)
                    .map_err(|e| encoding_error(&reader, e))?;
                append_text(&mut stack, &decoded);
            }
            Event::GeneralRef(reference) => {
                let name = reader
                    .decoder()
                    .decode(&reference)
                    .map_err(|e| encoding_error(&reader, e))?;
                if let Some(resolved) = resolve_reference(&name) {
                    append_text(&mut stack, &resolved);
                }
            }
            Event::Eof => {
                if let Some(open) = stack.last() {
                    return Err(ParserError::Xml {
                        position: reader.buffer_position(),
                        message: format!("unclosed element <{}>", open.name),
                    });
                }
                break;
            }
            _ => {}
        }

        if root.is_some() && stack.is_empty() {
            break;
        }
    }

    root.ok_or(ParserError::EmptyDocument)
}

fn owned_namespace(resolved: &ResolveResult<'_>) -> Option<String> {
    match resolved {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        _ => None,
    }
}

fn open_element(
    reader: &NsReader<&[u8]>,
    namespace: Option<String>,
    start: &BytesStart<'_>,
) -> Result<XmlElement, ParserError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut element = XmlElement::new(name, namespace);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| xml_error(reader, e))?;
        let key = attr.key;
        if key.as_ref().starts_with(b"xmlns") {
            continue;
        }
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|e| xml_error(reader, e))?;
        element.attributes.push((
            String::from_utf8_lossy(key.local_name().as_ref()).into_owned(),
            value.into_owned(),
        ));
    }
    Ok(element)
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn append_text(stack: &mut [XmlElement], text: &str) {
    if let Some(parent) = stack.last_mut() {
        parent.push_text(text);
    }
}

/// Character references and the five predefined entities.
fn resolve_reference(name: &str) -> Option<String> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    quick_xml::escape::resolve_predefined_entity(name).map(str::to_string)
}

fn encoding_error(reader: &NsReader<&[u8]>, error: impl std::fmt::Display) -> ParserError {
    ParserError::Encoding {
        position: reader.buffer_position(),
        message: error.to_string(),
    }
}

fn xml_error(reader: &NsReader<&[u8]>, error: impl std::fmt::Display) -> ParserError {
    ParserError::Xml {
        position: reader.error_position(),
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_namespaces_and_local_names() {
        let doc = br#"<?xml version="1.0"?>
<manifest xmlns="http://example.com/cp" xmlns:lom="http://example.com/lom" identifier="M1">
  <lom:title><lom:string>Course</lom:string></lom:title>
  <resources/>
</manifest>"#;
        let root = parse_document(doc).expect("parse");
        assert_eq!(root.name, "manifest");
        assert_eq!(root.namespace(), Some("http://example.com/cp"));
        assert_eq!(root.attr("identifier"), Some("M1"));
        assert_eq!(root.attributes.len(), 1);

        let title = root.child("title").expect("title");
        assert_eq!(title.namespace(), Some("http://example.com/lom"));
        assert_eq!(title.child("string").map(XmlElement::text).as_deref(), Some("Course"));
    }

    #[test]
    fn decodes_entities_and_cdata() {
        let doc = b"<a>x &amp; y &#233;<![CDATA[<b>raw</b>]]></a>";
        let root = parse_document(doc).expect("parse");
        assert_eq!(root.text(), "x & y \u{e9}<b>raw</b>");
    }

    #[test]
    fn descendants_are_in_document_order() {
        let doc = b"<r><a><b/><c/></a><d/></r>";
        let root = parse_document(doc).expect("parse");
        let names: Vec<_> = root.descendants().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
        assert_eq!(root.find("c").map(|e| e.name.as_str()), Some("c"));
        assert!(root.child("c").is_none());
    }

    #[test]
    fn child_lookup_does_not_borrow_the_name() {
        let root = parse_document(b"<r><a/><b/></r>").expect("parse");
        let found = {
            let name = String::from("b");
            root.child(&name)
        };
        assert_eq!(found.map(|e| e.name.as_str()), Some("b"));
        let names: Vec<_> = {
            let name = "a".to_string();
            root.children_named(&name).collect()
        };
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn rejects_mismatched_tags() {
        let err = parse_document(b"<a><b></a>").unwrap_err();
        assert!(matches!(err, ParserError::Xml { .. }));
    }

    #[test]
    fn rejects_empty_input() {
        let err = parse_document(b"   ").unwrap_err();
        assert!(matches!(err, ParserError::EmptyDocument));
    }
}
