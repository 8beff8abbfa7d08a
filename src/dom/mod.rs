//! # Host DOM
//!
//! The converter never tokenizes markup itself. A host supplies a
//! [`MarkupParser`] that turns a markup string into a list of DOM-like nodes,
//! the same shape a browser exposes through `childNodes`: every node has a
//! `nodeName`, element nodes carry attributes and children, and text nodes
//! carry their `data`.
//!
//! [`XmlMarkupParser`] is the bundled implementation, a lenient fragment
//! parser built on quick-xml. It is good enough for the small inline subset
//! the converter understands; hosts with a real HTML parser should plug that
//! in instead.

use std::borrow::Cow;

use quick_xml::escape::{resolve_html5_entity, resolve_predefined_entity};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::Result;

/// Node name used for text nodes, matching the DOM.
pub const TEXT_NODE_NAME: &str = "#text";

/// HTML elements that never have children or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// A DOM-like node as produced by a host parser.
#[derive(Debug, Clone, PartialEq)]
pub struct DomNode {
    /// Tag name as the host reports it, or `#text`.
    pub node_name: String,
    /// `(name, value)` pairs in source order. Empty for text nodes.
    pub attributes: Vec<(String, String)>,
    pub child_nodes: Vec<DomNode>,
    /// Character data. Only set for text nodes.
    pub data: Option<String>,
}

impl DomNode {
    pub fn text(data: impl Into<String>) -> Self {
        DomNode {
            node_name: TEXT_NODE_NAME.to_string(),
            attributes: Vec::new(),
            child_nodes: Vec::new(),
            data: Some(data.into()),
        }
    }

    pub fn element(node_name: impl Into<String>, child_nodes: Vec<DomNode>) -> Self {
        DomNode {
            node_name: node_name.into(),
            attributes: Vec::new(),
            child_nodes,
            data: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn is_text(&self) -> bool {
        self.node_name == TEXT_NODE_NAME
    }
}

/// Turns a markup string into the child nodes of its root container.
pub trait MarkupParser {
    fn parse(&self, markup: &str) -> Result<Vec<DomNode>>;
}

impl<F> MarkupParser for F
where
    F: Fn(&str) -> Result<Vec<DomNode>>,
{
    fn parse(&self, markup: &str) -> Result<Vec<DomNode>> {
        self(markup)
    }
}

/// Lenient markup fragment parser backed by quick-xml.
///
/// The markup is read as the content of a synthetic root element:
/// - mismatched end tags close back to the nearest open element of that name,
///   and end tags with no open element are ignored;
/// - elements still open at end of input are closed;
/// - void elements (`<br>`, `<img>`, ...) never take children;
/// - comments, processing instructions and doctypes are dropped;
/// - HTML entities are decoded, unknown ones are kept verbatim;
/// - a `<` that cannot start a tag is text;
/// - on markup it cannot read at all, the rest of the input becomes text.
///
/// It never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlMarkupParser;

impl XmlMarkupParser {
    pub fn new() -> Self {
        XmlMarkupParser
    }
}

impl MarkupParser for XmlMarkupParser {
    fn parse(&self, markup: &str) -> Result<Vec<DomNode>> {
        let source = escape_stray_lt(markup);
        let mut reader = Reader::from_str(&source);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        // Index 0 is the synthetic root and is never closed by an end tag.
        let mut open: Vec<DomNode> = vec![DomNode::element("", Vec::new())];
        let mut buf = Vec::new();

        loop {
            let start = reader.buffer_position();
            let event = match reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(e) => {
                    log::warn!(
                        "markup not well-formed at byte {}: {}; keeping the rest as text",
                        start,
                        e
                    );
                    let rest = usize::try_from(start).ok().and_then(|s| source.get(s..));
                    if let Some(rest) = rest {
                        append(&mut open, DomNode::text(decode_entities(rest)));
                    }
                    break;
                }
            };
            match event {
                Event::Start(e) => {
                    let element = element_from_start(&e);
                    if is_void(&element.node_name) {
                        append(&mut open, element);
                    } else {
                        open.push(element);
                    }
                }
                Event::Empty(e) => append(&mut open, element_from_start(&e)),
                Event::End(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    close(&mut open, &name);
                }
                Event::Text(e) => {
                    let data = decode_entities(&String::from_utf8_lossy(&e));
                    append(&mut open, DomNode::text(data));
                }
                Event::CData(e) => {
                    append(&mut open, DomNode::text(String::from_utf8_lossy(&e)));
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        while open.len() > 1 {
            close_top(&mut open);
        }
        Ok(open.pop().map(|root| root.child_nodes).unwrap_or_default())
    }
}

fn element_from_start(e: &BytesStart) -> DomNode {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let mut node = DomNode::element(name, Vec::new());
    for attr in e.html_attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = decode_entities(&String::from_utf8_lossy(&attr.value));
        node.attributes.push((key, value));
    }
    node
}

/// Escape every `<` that cannot open a tag, comment, or processing
/// instruction, so the reader keeps it as text. Comments and CDATA sections
/// are copied untouched.
fn escape_stray_lt(markup: &str) -> Cow<'_, str> {
    if !markup.contains('<') {
        return Cow::Borrowed(markup);
    }
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;
    while let Some(lt) = rest.find('<') {
        out.push_str(&rest[..lt]);
        let tail = &rest[lt..];
        let verbatim = VERBATIM_SECTIONS.iter().find_map(|(open, close)| {
            tail.starts_with(open)
                .then(|| tail[open.len()..].find(close).map(|end| open.len() + end + close.len()))
        });
        match verbatim {
            Some(Some(len)) => {
                out.push_str(&tail[..len]);
                rest = &tail[len..];
            }
            // Unterminated: the reader reports it and the tail is kept as text.
            Some(None) => {
                out.push_str(tail);
                rest = "";
            }
            None => {
                if opens_markup(&tail[1..]) {
                    out.push('<');
                } else {
                    out.push_str("&lt;");
                }
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

const VERBATIM_SECTIONS: &[(&str, &str)] = &[("<!--", "-->"), ("<![CDATA[", "]]>")];

fn opens_markup(after_lt: &str) -> bool {
    after_lt
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
}

/// Decode character references one at a time. Unknown or malformed
/// references are kept exactly as written.
fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let resolved = after
            .find(';')
            .and_then(|semi| resolve_entity(&after[..semi]).map(|text| (text, semi)));
        match resolved {
            Some((text, semi)) => {
                out.push_str(&text);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn resolve_entity(name: &str) -> Option<Cow<'static, str>> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(|c| Cow::Owned(c.to_string()));
    }
    resolve_predefined_entity(name)
        .or_else(|| resolve_html5_entity(name))
        .map(Cow::Borrowed)
}

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

fn append(open: &mut [DomNode], node: DomNode) {
    if let Some(parent) = open.last_mut() {
        parent.child_nodes.push(node);
    }
}

/// Close the innermost open element named `name`, along with everything
/// opened inside it. Does nothing if no such element is open.
fn close(open: &mut Vec<DomNode>, name: &str) {
    let Some(pos) = open
        .iter()
        .skip(1)
        .rposition(|node| node.node_name.eq_ignore_ascii_case(name))
    else {
        return;
    };
    // rposition over the skipped iterator is relative to index 1.
    let target = pos + 1;
    while open.len() > target {
        close_top(open);
    }
}

fn close_top(open: &mut Vec<DomNode>) {
    if open.len() > 1 {
        if let Some(node) = open.pop() {
            append(open, node);
        }
    }
}
