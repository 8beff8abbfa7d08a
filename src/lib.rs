//! # htmldef
//!
//! Turns a small subset of HTML into document-definition blocks for a PDF
//! layout engine.
//!
//! A document definition is a JSON tree of blocks (`text`, `stack`, `ol`,
//! `ul`, `table`, ...). Anywhere in its `content`, a block may instead be a
//! markup descriptor, `{ "html": "...", "settings": { ... } }`. htmldef
//! replaces each descriptor with the blocks its markup describes, keeping
//! every other field of the descriptor.
//!
//! Only a handful of tags mean anything: `P`/`DIV` become text blocks,
//! `OL`/`UL` become lists, and `B`/`STRONG`/`I`/`EM` set `bold`/`italics` on
//! the text runs below them. Other tags are walked for their text.
//!
//! ## Architecture
//!
//! ```text
//! markup string
//!       ↓
//!   [dom]       — host MarkupParser → DOM-like nodes
//!       ↓
//!   [ingest]    — DOM nodes → RawNode tree (uppercase tags)
//!       ↓
//!   [extract]   — tag families, text runs, logical blocks
//!       ↓
//!   [assemble]  — stack of blocks, settings effects
//!       ↓
//!   [builder]   — merge into the document definition, in place
//! ```
//!
//! [`vfs`] is the in-memory asset store the renderer reads fonts from when
//! running without a filesystem.

pub mod assemble;
pub mod builder;
pub mod dom;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod model;
pub mod vfs;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use builder::HtmlBuilder;
pub use error::{HtmlDefError, Result};

use serde_json::Value;

/// Convert every markup descriptor in a document definition, in place, with
/// the bundled parser and default tables.
pub fn set_document_definition(doc_definition: &mut Value) -> Result<()> {
    HtmlBuilder::new().set_document_definition(doc_definition)
}

/// Convert a document definition given as JSON, returning the converted JSON.
pub fn convert_json(json: &str) -> Result<String> {
    let mut doc: Value = serde_json::from_str(json)?;
    set_document_definition(&mut doc)?;
    Ok(serde_json::to_string(&doc)?)
}
