//! Pre-pass over raw QTI bytes before they reach the XML reader.
//!
//! Exported cartridges routinely contain HTML named entities (`&nbsp;`,
//! `&rsquo;`) outside CDATA, which are not legal XML. Every named entity
//! other than the five XML predefined ones is removed.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::bytes::{Captures, Regex};

static NAMED_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&([a-zA-Z]+);").expect("Invalid named entity regex"));

const XML_ENTITIES: [&[u8]; 5] = [b"amp", b"lt", b"gt", b"quot", b"apos"];

/// Remove named entities XML does not predefine. Numeric references survive.
pub fn strip_unknown_entities(xml: &[u8]) -> Cow<'_, [u8]> {
    NAMED_ENTITY.replace_all(xml, |caps: &Captures<'_>| {
        if XML_ENTITIES.contains(&&caps[1]) {
            caps[0].to_vec()
        } else {
            Vec::new()
        }
    })
}
