// Rich-text tokenizer
//
// *Le Balisage* (The Markup) - Flat tag/text token stream over rendered HTML

use once_cell::sync::Lazy;
use quick_xml::escape::{escape, partial_escape, resolve_html5_entity, unescape_with};
use regex::{Captures, Regex};
use std::borrow::Cow;

/// Elements whose text is never annotated
const SKIPPED_ELEMENTS: &[&str] = &["a", "button", "script", "style"];

/// Class marking an embedded file resource
pub const FILE_RESOURCE_CLASS: &str = "file-resource";

/// Elements without a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "pb",
    "source", "track", "wbr",
];

static CHARACTER_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#?[0-9A-Za-z]{1,32};").expect("character reference pattern is valid"));

/// Shape of a tag token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `<p>`
    Open,

    /// `</p>`
    Close,

    /// `<br/>` or a void element
    SelfClosing,

    /// Comment, doctype or processing instruction
    Other,
}

/// One tag with its parsed attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'a> {
    /// Source text of the tag, including the angle brackets
    pub raw: &'a str,

    /// Lower-cased element name (empty for [`TagKind::Other`])
    pub name: String,

    /// Tag shape
    pub kind: TagKind,

    /// Attributes in source order, values entity-decoded
    pub attrs: Vec<(String, String)>,
}

impl Tag<'_> {
    /// Attribute value by (lower-cased) name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether the `class` attribute lists `class`
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }
}

/// Token of the flat stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Raw (still entity-encoded) text
    Text(&'a str),

    /// Markup tag
    Tag(Tag<'a>),
}

/// Split HTML into tags and text runs. Never fails; a `<` that does not
/// start a well-formed tag is text.
pub fn tokenize(html: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;
    let bytes = html.as_bytes();

    while pos < bytes.len() {
        if bytes[pos] != b'<' {
            pos += 1;
            continue;
        }
        match scan_tag(html, pos) {
            Some((tag, end)) => {
                if text_start < pos {
                    tokens.push(Token::Text(&html[text_start..pos]));
                }
                tokens.push(Token::Tag(tag));
                pos = end;
                text_start = end;
            }
            None => pos += 1,
        }
    }

    if text_start < html.len() {
        tokens.push(Token::Text(&html[text_start..]));
    }
    tokens
}

/// Parse one tag starting at `start` (which holds `<`); returns the tag and
/// the byte offset just past it.
fn scan_tag(html: &str, start: usize) -> Option<(Tag<'_>, usize)> {
    let rest = &html[start..];

    if rest.starts_with("<!--") {
        let end = rest.find("-->").map_or(html.len(), |i| start + i + 3);
        return Some((other_tag(&html[start..end]), end));
    }
    if rest.starts_with("<!") || rest.starts_with("<?") {
        let end = start + rest.find('>')? + 1;
        return Some((other_tag(&html[start..end]), end));
    }

    let (closing, name_start) = if rest.starts_with("</") {
        (true, 2)
    } else {
        (false, 1)
    };
    if !rest[name_start..].starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }

    let name_len = rest[name_start..]
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == ':'))
        .unwrap_or(rest.len() - name_start);
    let name = rest[name_start..name_start + name_len].to_ascii_lowercase();

    let mut attrs = Vec::new();
    let mut cursor = name_start + name_len;
    let mut self_closing = false;

    loop {
        let after_ws = rest[cursor..].trim_start();
        cursor = rest.len() - after_ws.len();
        let c = after_ws.chars().next()?;
        match c {
            '>' => {
                cursor += 1;
                break;
            }
            '/' => {
                self_closing = true;
                cursor += 1;
            }
            _ => {
                let (attr, consumed) = scan_attr(after_ws)?;
                attrs.extend(attr);
                cursor += consumed;
            }
        }
    }

    let kind = if closing {
        TagKind::Close
    } else if self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
        TagKind::SelfClosing
    } else {
        TagKind::Open
    };

    let end = start + cursor;
    Some((
        Tag {
            raw: &html[start..end],
            name,
            kind,
            attrs,
        },
        end,
    ))
}

fn scan_attr(input: &str) -> Option<(Option<(String, String)>, usize)> {
    let name_len = input
        .find(|c: char| c.is_whitespace() || matches!(c, '=' | '>' | '/'))
        .unwrap_or(input.len());
    if name_len == 0 {
        // stray character such as a lone quote
        let skip = input.chars().next()?.len_utf8();
        return Some((None, skip));
    }
    let name = input[..name_len].to_ascii_lowercase();

    let after_name = input[name_len..].trim_start();
    if !after_name.starts_with('=') {
        // valueless attribute; whitespace is consumed by the caller
        return Some((Some((name, String::new())), name_len));
    }

    let value_part = after_name[1..].trim_start();
    let value_offset = input.len() - value_part.len();
    let quote = value_part.chars().next()?;

    let (value, consumed) = if quote == '"' || quote == '\'' {
        let close = value_part[1..].find(quote)?;
        (&value_part[1..1 + close], value_offset + close + 2)
    } else {
        let len = value_part
            .find(|c: char| c.is_whitespace() || c == '>')
            .unwrap_or(value_part.len());
        (&value_part[..len], value_offset + len)
    };

    Some((Some((name, decode_entities(value).into_owned())), consumed))
}

fn other_tag(raw: &str) -> Tag<'_> {
    Tag {
        raw,
        name: String::new(),
        kind: TagKind::Other,
        attrs: Vec::new(),
    }
}

/// Tracks whether the current position is inside an element whose text must
/// not be annotated (links, buttons, scripts, styles, file resources).
#[derive(Debug, Default)]
pub struct SkipTracker {
    stack: Vec<OpenElement>,
    suppressed: usize,
    resources: usize,
}

#[derive(Debug)]
struct OpenElement {
    name: String,
    skip: bool,
    resource: bool,
}

impl SkipTracker {
    /// Fresh tracker at document level
    pub fn new() -> Self {
        Self::default()
    }

    /// Update with a tag token
    pub fn observe(&mut self, tag: &Tag<'_>) {
        match tag.kind {
            TagKind::Open => {
                let resource = tag.has_class(FILE_RESOURCE_CLASS);
                let skip = resource || SKIPPED_ELEMENTS.contains(&tag.name.as_str());
                self.suppressed += usize::from(skip);
                self.resources += usize::from(resource);
                self.stack.push(OpenElement {
                    name: tag.name.clone(),
                    skip,
                    resource,
                });
            }
            TagKind::Close => {
                // unbalanced markup: pop up to the matching element
                if let Some(pos) = self.stack.iter().rposition(|open| open.name == tag.name) {
                    for open in self.stack.drain(pos..) {
                        self.suppressed -= usize::from(open.skip);
                        self.resources -= usize::from(open.resource);
                    }
                }
            }
            TagKind::SelfClosing | TagKind::Other => {}
        }
    }

    /// Whether text at the current position is excluded from annotation
    pub fn is_skipping(&self) -> bool {
        self.suppressed > 0
    }

    /// Whether the current position lies inside a file resource element
    pub fn in_file_resource(&self) -> bool {
        self.resources > 0
    }
}

/// Decode named (HTML5) and numeric character references. Unknown
/// references and bare `&` are kept as written.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    CHARACTER_REFERENCE.replace_all(text, |caps: &Captures<'_>| {
        let reference = &caps[0];
        unescape_with(reference, resolve_html5_entity).map_or_else(|_| reference.to_string(), Cow::into_owned)
    })
}

/// Escape text content (`&`, `<`, `>`)
pub fn escape_text(text: &str) -> Cow<'_, str> {
    partial_escape(text)
}

/// Escape an attribute value, quotes included
pub fn escape_attr(value: &str) -> String {
    escape(value).into_owned()
}
