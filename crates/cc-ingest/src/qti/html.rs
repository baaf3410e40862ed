//! Lenient tokenizer for the HTML fragments embedded in `<mattext>`.
//!
//! Only tag boundaries matter to the style interpreter, so the tokenizer
//! never fails: anything that does not look like markup is text. Tag
//! bodies go through quick-xml's HTML attribute parser; the boundaries are
//! found here because a fragment with a literal `<` or an unclosed tag
//! would stop a `quick_xml::Reader` outright.

use quick_xml::events::BytesStart;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlToken {
    Open {
        name: String,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    },
    Close {
        name: String,
    },
    Text(String),
}

impl HtmlToken {
    pub fn attr<'a>(attributes: &'a [(String, String)], name: &str) -> Option<&'a str> {
        attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Elements that never have a closing tag.
pub const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

pub fn tokenize(input: &str) -> Vec<HtmlToken> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut rest = input;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            text.push_str(rest);
            break;
        };
        text.push_str(&rest[..lt]);
        rest = &rest[lt..];

        match scan_markup(rest) {
            Some((token, consumed)) => {
                flush_text(&mut tokens, &mut text);
                if let Some(token) = token {
                    tokens.push(token);
                }
                rest = &rest[consumed..];
            }
            None => {
                text.push('<');
                rest = &rest[1..];
            }
        }
    }

    flush_text(&mut tokens, &mut text);
    tokens
}

fn flush_text(tokens: &mut Vec<HtmlToken>, text: &mut String) {
    if !text.is_empty() {
        tokens.push(HtmlToken::Text(std::mem::take(text)));
    }
}

/// Recognize markup at the start of `input` (which begins with `<`).
///
/// Returns the token, if any, and the number of bytes consumed. Comments
/// and declarations consume input without producing a token. `None`
/// means the `<` is literal text.
fn scan_markup(input: &str) -> Option<(Option<HtmlToken>, usize)> {
    let after = &input[1..];

    if let Some(comment) = after.strip_prefix("!--") {
        let consumed = comment
            .find("-->")
            .map_or(input.len(), |end| 4 + end + 3);
        return Some((None, consumed));
    }
    if after.starts_with('!') || after.starts_with('?') {
        let consumed = after.find('>').map_or(input.len(), |end| end + 2);
        return Some((None, consumed));
    }
    if let Some(close) = after.strip_prefix('/') {
        if !close.starts_with(|ch: char| ch.is_ascii_alphabetic()) {
            return None;
        }
        let end = close.find('>')?;
        let name = read_name(close);
        return Some((
            Some(HtmlToken::Close {
                name: name.to_ascii_lowercase(),
            }),
            2 + end + 1,
        ));
    }
    if !after.starts_with(|ch: char| ch.is_ascii_alphabetic()) {
        return None;
    }
    scan_open_tag(after).map(|(token, consumed)| (Some(token), 1 + consumed))
}

fn read_name(input: &str) -> &str {
    let end = input
        .find(|ch: char| ch.is_whitespace() || ch == '/' || ch == '>')
        .unwrap_or(input.len());
    &input[..end]
}

/// Byte offset of the `>` that ends a tag body, skipping quoted values.
fn tag_end(body: &str) -> Option<usize> {
    let mut quote = None;
    let mut after_equals = false;
    for (index, ch) in body.char_indices() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => {}
            None => match ch {
                '>' => return Some(index),
                '"' | '\'' if after_equals => quote = Some(ch),
                _ => {}
            },
        }
        if !ch.is_whitespace() {
            after_equals = quote.is_none() && ch == '=';
        }
    }
    None
}

fn scan_open_tag(input: &str) -> Option<(HtmlToken, usize)> {
    let end = tag_end(input)?;
    let content = input[..end].trim_end();
    let (content, self_closing) = match content.strip_suffix('/') {
        Some(stripped) => (stripped, true),
        None => (content, false),
    };
    let name = read_name(content);
    let tag = BytesStart::from_content(content, name.len());

    let mut attributes = tag.html_attributes();
    attributes.with_checks(false);
    let attributes = attributes
        .filter_map(Result::ok)
        .map(|attribute| {
            (
                String::from_utf8_lossy(attribute.key.as_ref()).to_ascii_lowercase(),
                String::from_utf8_lossy(&attribute.value).into_owned(),
            )
        })
        .collect();

    Some((open(name, attributes, self_closing), end + 1))
}

fn open(name: &str, attributes: Vec<(String, String)>, self_closing: bool) -> HtmlToken {
    HtmlToken::Open {
        name: name.to_ascii_lowercase(),
        attributes,
        self_closing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_tag(name: &str, attributes: &[(&str, &str)], self_closing: bool) -> HtmlToken {
        HtmlToken::Open {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            self_closing,
        }
    }

    fn close_tag(name: &str) -> HtmlToken {
        HtmlToken::Close {
            name: name.to_string(),
        }
    }

    fn text(value: &str) -> HtmlToken {
        HtmlToken::Text(value.to_string())
    }

    #[test]
    fn splits_tags_and_text() {
        let tokens = tokenize(r#"<P>Hi <B class=x>there</b><br/></p>"#);
        assert_eq!(
            tokens,
            vec![
                open_tag("p", &[], false),
                text("Hi "),
                open_tag("b", &[("class", "x")], false),
                text("there"),
                close_tag("b"),
                open_tag("br", &[], true),
                close_tag("p"),
            ]
        );
    }

    #[test]
    fn reads_quoted_and_bare_attributes() {
        let tokens = tokenize(
            r#"<img src="$IMS-CC-FILEBASE$/a b.png" width='120' height=80 alt=x hidden>"#,
        );
        assert_eq!(
            tokens,
            vec![open_tag(
                "img",
                &[
                    ("src", "$IMS-CC-FILEBASE$/a b.png"),
                    ("width", "120"),
                    ("height", "80"),
                    ("alt", "x"),
                    ("hidden", ""),
                ],
                false,
            )]
        );
    }

    #[test]
    fn quoted_values_may_contain_angle_brackets() {
        let tokens = tokenize(r#"<img alt="a > b" src=x.png/>tail"#);
        assert_eq!(
            tokens,
            vec![
                open_tag("img", &[("alt", "a > b"), ("src", "x.png")], true),
                text("tail"),
            ]
        );
    }

    #[test]
    fn literal_angle_brackets_stay_text() {
        assert_eq!(tokenize("1 < 2 and 3 <= 4"), vec![text("1 < 2 and 3 <= 4")]);
    }

    #[test]
    fn unterminated_tag_is_text() {
        assert_eq!(tokenize("a <b class=\"x"), vec![text("a <b class=\"x")]);
    }

    #[test]
    fn comments_and_declarations_are_skipped() {
        assert_eq!(
            tokenize("a<!-- <b>hidden</b> -->b<!DOCTYPE html>c"),
            vec![text("a"), text("b"), text("c")]
        );
    }
}
