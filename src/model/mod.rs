//! # Conversion Model
//!
//! The intermediate representations the pipeline passes between stages.
//!
//! [`RawNode`] is the plain recursive tree produced from the host DOM: a text
//! leaf or an element with its tag name, attributes, and children. The
//! extractor turns it into [`TextRun`]s and [`LogicalBlock`]s, which serialize
//! directly into document-definition JSON:
//!
//! ```text
//! <p>Hi <b>there</b></p>   →   { "text": [ { "text": "Hi " }, { "text": "there", "bold": true } ] }
//! <ul><li>a</li></ul>      →   { "ul": [ [ { "text": "a" } ] ] }
//! ```
//!
//! All of these are transient: built and consumed inside a single conversion.

use serde::{Serialize, Serializer};
use serde_json::Value;

/// A node of the ingested markup tree.
#[derive(Debug, Clone, PartialEq)]
pub enum RawNode {
    /// Raw text content, untrimmed.
    Text(String),
    Element(RawElement),
}

impl RawNode {
    /// The node type used for classification: the uppercase tag name, or
    /// `#text` for text leaves.
    pub fn node_type(&self) -> &str {
        match self {
            RawNode::Text(_) => "#text",
            RawNode::Element(el) => &el.tag_name,
        }
    }

    /// Child nodes, if this is an element that has any.
    pub fn inner(&self) -> Option<&[RawNode]> {
        match self {
            RawNode::Text(_) => None,
            RawNode::Element(el) => el.inner.as_deref(),
        }
    }
}

/// An element of the ingested markup tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RawElement {
    /// Uppercase tag name (`P`, `STRONG`, ...).
    pub tag_name: String,
    /// Attributes in source order.
    pub attributes: Vec<Attribute>,
    /// Children in source order. `None` when the element has no children.
    pub inner: Option<Vec<RawNode>>,
}

/// A single `name="value"` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// The minimal unit of styled text in a document definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextRun {
    pub text: String,
    #[serde(skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub italics: bool,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl TextRun {
    pub fn new(text: impl Into<String>) -> Self {
        TextRun {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// What a classified element produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BlockContent {
    /// `P`, `DIV`: a single text block.
    Paragraph { text: Vec<TextRun> },
    /// `OL`: one run sequence per item.
    OrderedList { ol: Vec<Vec<TextRun>> },
    /// `UL`: one run sequence per item.
    UnorderedList { ul: Vec<Vec<TextRun>> },
}

/// A renderer-ready block, optionally adjusted by per-descriptor settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogicalBlock {
    #[serde(flatten)]
    pub content: BlockContent,
    /// `[left, top, right, bottom]` in points.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_margin"
    )]
    pub margin: Option<[f64; 4]>,
}

/// Whole offsets are written as integers: `[0, 0, 0, 12]`, not `12.0`.
fn serialize_margin<S: Serializer>(
    margin: &Option<[f64; 4]>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match margin {
        Some(sides) => serializer.collect_seq(sides.iter().map(|&side| Points(side))),
        None => serializer.serialize_none(),
    }
}

struct Points(f64);

impl Serialize for Points {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        // Beyond 2^53 an f64 no longer holds every integer exactly.
        if self.0.fract() == 0.0 && self.0.abs() < 9_007_199_254_740_992.0 {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

impl LogicalBlock {
    pub fn new(content: BlockContent) -> Self {
        LogicalBlock {
            content,
            margin: None,
        }
    }

    pub fn paragraph(text: Vec<TextRun>) -> Self {
        Self::new(BlockContent::Paragraph { text })
    }

    pub fn ordered_list(items: Vec<Vec<TextRun>>) -> Self {
        Self::new(BlockContent::OrderedList { ol: items })
    }

    pub fn unordered_list(items: Vec<Vec<TextRun>>) -> Self {
        Self::new(BlockContent::UnorderedList { ul: items })
    }

    /// Serialize into a document-definition object.
    pub fn to_value(&self) -> Value {
        // Strings, bools and floats only; serializing these cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// The assembled result for one markup descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stack {
    pub stack: Vec<LogicalBlock>,
}

impl Stack {
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Collapse into the single document-definition node that replaces the
    /// descriptor: `{text: ""}` when empty, the block itself when there is
    /// exactly one, `{stack: [...]}` otherwise.
    pub fn into_node(self) -> Value {
        let mut blocks = self.stack;
        match blocks.len() {
            0 => serde_json::json!({ "text": "" }),
            1 => blocks.remove(0).to_value(),
            _ => {
                let blocks: Vec<Value> = blocks.iter().map(LogicalBlock::to_value).collect();
                serde_json::json!({ "stack": blocks })
            }
        }
    }
}
