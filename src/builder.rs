//! # Document Definition Builder
//!
//! Rewrites the `content` array of a document definition in place, replacing
//! every markup descriptor with the blocks assembled from its markup:
//!
//! ```text
//! { "html": "<p>Hi</p>", "settings": { "verticalOffset": 4 }, "style": "x" }
//!     → { "text": [ { "text": "Hi" } ], "margin": [0, 0, 0, 4], "style": "x" }
//! ```
//!
//! Entries without `html` are searched for nested content (`text`, `stack`,
//! `table.body`, `columns`, `ol`, `ul`) so descriptors can live anywhere in
//! the tree. Entries that are already plain blocks are left untouched, which
//! makes processing idempotent.
//!
//! The caller's document is mutated. Do not share one document definition
//! between concurrent conversions.

use serde_json::{Map, Value};

use crate::assemble::{build_stack, SettingsTable};
use crate::dom::{MarkupParser, XmlMarkupParser};
use crate::error::{HtmlDefError, Result};
use crate::extract::TagTable;
use crate::ingest::ingest;
use crate::model::Stack;

/// Where nested content may live on a block, in lookup order. Multi-segment
/// paths are walked key by key.
pub const DEFAULT_CHILD_PATHS: &[&[&str]] = &[
    &["text"],
    &["stack"],
    &["table", "body"],
    &["columns"],
    &["ol"],
    &["ul"],
];

/// Descriptor fields consumed by the conversion and not copied onto the result.
const DESCRIPTOR_FIELDS: &[&str] = &["html", "settings"];

/// Converts markup descriptors in document definitions.
pub struct HtmlBuilder<P = XmlMarkupParser> {
    parser: P,
    tags: TagTable,
    settings: SettingsTable,
}

impl Default for HtmlBuilder<XmlMarkupParser> {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlBuilder<XmlMarkupParser> {
    /// A builder with the bundled parser and the default tag and settings
    /// tables.
    pub fn new() -> Self {
        HtmlBuilder::with_parser(XmlMarkupParser)
    }
}

impl<P: MarkupParser> HtmlBuilder<P> {
    /// A builder that delegates markup parsing to a host parser.
    pub fn with_parser(parser: P) -> Self {
        HtmlBuilder {
            parser,
            tags: TagTable::default(),
            settings: SettingsTable::default(),
        }
    }

    pub fn with_tags(mut self, tags: TagTable) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_settings(mut self, settings: SettingsTable) -> Self {
        self.settings = settings;
        self
    }

    /// Process `doc_definition.content`, if there is one.
    pub fn set_document_definition(&self, doc_definition: &mut Value) -> Result<()> {
        match doc_definition.get_mut("content") {
            Some(Value::Array(content)) => self.process_content(content),
            _ => Ok(()),
        }
    }

    /// Replace every markup descriptor in `content`, recursing into nested
    /// content of the other entries.
    ///
    /// A descriptor whose markup cannot be parsed is replaced by an empty
    /// text block carrying its other fields, and processing carries on. The
    /// first such error is returned once every entry has been converted, so
    /// no `html` descriptor is ever left behind.
    pub fn process_content(&self, content: &mut [Value]) -> Result<()> {
        let mut first_error = None;
        self.process_entries(content, &mut first_error);
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn process_entries(&self, content: &mut [Value], first_error: &mut Option<HtmlDefError>) {
        for entry in content.iter_mut() {
            match entry {
                Value::Object(map) if map.contains_key("html") => {
                    let node = self.convert_descriptor(map).unwrap_or_else(|err| {
                        log::warn!("markup descriptor skipped: {}", err);
                        first_error.get_or_insert(err);
                        merge_fields(Stack::default().into_node(), map)
                    });
                    *entry = node;
                }
                Value::Object(_) | Value::Array(_) => {
                    if let Some(children) = children_of(entry) {
                        self.process_entries(children, first_error);
                    }
                }
                _ => {}
            }
        }
    }

    /// Run the full pipeline on one markup string.
    pub fn build(&self, markup: &str, settings: &Map<String, Value>) -> Result<Stack> {
        let dom = self.parser.parse(markup)?;
        let tree = ingest(&dom);
        Ok(build_stack(&tree, settings, &self.tags, &self.settings))
    }

    /// Convert one markup string into the document-definition node that
    /// replaces its descriptor.
    pub fn convert_markup(&self, markup: &str, settings: &Map<String, Value>) -> Result<Value> {
        Ok(self.build(markup, settings)?.into_node())
    }

    fn convert_descriptor(&self, descriptor: &Map<String, Value>) -> Result<Value> {
        let settings = match descriptor.get("settings") {
            Some(Value::Object(settings)) => settings.clone(),
            _ => Map::new(),
        };

        let stack = match descriptor.get("html").and_then(markup_source) {
            Some(markup) => self.build(&markup, &settings)?,
            None => Stack::default(),
        };
        if stack.is_empty() {
            log::debug!("markup descriptor produced no blocks, using empty text");
        } else {
            log::debug!("markup descriptor converted into {} block(s)", stack.len());
        }

        Ok(merge_fields(stack.into_node(), descriptor))
    }
}

/// Copy the descriptor's own fields onto the converted node.
fn merge_fields(mut node: Value, descriptor: &Map<String, Value>) -> Value {
    if let Value::Object(target) = &mut node {
        for (key, value) in descriptor {
            if !DESCRIPTOR_FIELDS.contains(&key.as_str()) {
                target.insert(key.clone(), value.clone());
            }
        }
    }
    node
}

/// The markup text of an `html` field. `null` stands for a field that is
/// present but undefined.
fn markup_source(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Locate the nested content of an entry. Arrays are their own content. For
/// objects the first child path whose first key is present decides, even if
/// the value there turns out not to be an array.
fn children_of(entry: &mut Value) -> Option<&mut Vec<Value>> {
    match entry {
        Value::Array(items) => Some(items),
        Value::Object(map) => {
            let path = DEFAULT_CHILD_PATHS
                .iter()
                .find(|path| map.contains_key(path[0]))?;
            let mut current = map.get_mut(path[0])?;
            for key in &path[1..] {
                current = current.get_mut(*key)?;
            }
            match current {
                Value::Array(items) => Some(items),
                _ => None,
            }
        }
        _ => None,
    }
}
