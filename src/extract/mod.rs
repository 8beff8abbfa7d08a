//! # Tag Classification and Text Extraction
//!
//! Walks the ingested tree and turns it into styled text runs and logical
//! blocks.
//!
//! Inline formatting is carried down the tree as a list of
//! [`FormattingAction`]s. Every registered tag an element passes through adds
//! its action, and each text leaf gets every action of its ancestors applied
//! in order, outermost first. The list is copied per subtree, so an action
//! never leaks into a sibling:
//!
//! ```text
//! <p><b>x <i>y</i></b> z</p>
//!        x → [bold]          {text: "x ", bold}
//!        y → [bold, italics] {text: "y", bold, italics}
//!        z → []              {text: " z"}
//! ```
//!
//! Unregistered inline tags (`SPAN`, `A`, `LI`, ...) add nothing but are still
//! walked, so their text is kept.

use crate::model::{LogicalBlock, RawNode, TextRun};

/// Applies one inline style to a text run.
pub type FormattingAction = fn(&mut TextRun);

/// A registered family of tags sharing one formatting action.
#[derive(Debug, Clone)]
struct TagFamily {
    /// Direct lookup key.
    key: String,
    /// Every tag name in the family, uppercase.
    tags: Vec<String>,
    action: FormattingAction,
}

/// The inline tag registry.
#[derive(Debug, Clone)]
pub struct TagTable {
    families: Vec<TagFamily>,
}

fn make_bold(run: &mut TextRun) {
    run.bold = true;
}

fn make_italic(run: &mut TextRun) {
    run.italics = true;
}

impl Default for TagTable {
    fn default() -> Self {
        let mut table = TagTable::empty();
        table
            .register("B", &["B", "STRONG"], make_bold)
            .register("EM", &["I", "EM"], make_italic);
        table
    }
}

impl TagTable {
    /// A table with no registered families.
    pub fn empty() -> Self {
        TagTable {
            families: Vec::new(),
        }
    }

    /// Register a family, replacing any family with the same key.
    pub fn register(&mut self, key: &str, tags: &[&str], action: FormattingAction) -> &mut Self {
        let family = TagFamily {
            key: key.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            action,
        };
        match self.families.iter_mut().find(|f| f.key == key) {
            Some(existing) => *existing = family,
            None => self.families.push(family),
        }
        self
    }

    /// Find the action for a tag: a direct key match wins, otherwise the
    /// first family listing the tag. Case-sensitive.
    pub fn classify_tag(&self, tag_name: &str) -> Option<FormattingAction> {
        if let Some(family) = self.families.iter().find(|f| f.key == tag_name) {
            return Some(family.action);
        }
        self.families
            .iter()
            .find(|f| f.tags.iter().any(|t| t == tag_name))
            .map(|f| f.action)
    }

    /// Collect the text runs under `inner`, applying `inherited` to each.
    ///
    /// Returns `None` when there is nothing to walk. Whitespace-only text
    /// leaves are dropped; other text is kept untrimmed.
    pub fn extract_text_runs(
        &self,
        inner: Option<&[RawNode]>,
        inherited: &[FormattingAction],
    ) -> Option<Vec<TextRun>> {
        let inner = inner.filter(|nodes| !nodes.is_empty())?;
        let mut runs = Vec::new();

        for child in inner {
            match child {
                RawNode::Text(content) => {
                    if content.trim().is_empty() {
                        continue;
                    }
                    let mut run = TextRun::new(content.as_str());
                    for action in inherited {
                        action(&mut run);
                    }
                    runs.push(run);
                }
                RawNode::Element(el) => {
                    let sub = match self.classify_tag(&el.tag_name) {
                        Some(action) => {
                            let mut actions = inherited.to_vec();
                            actions.push(action);
                            self.extract_text_runs(el.inner.as_deref(), &actions)
                        }
                        None => {
                            log::trace!("no formatting registered for <{}>", el.tag_name);
                            self.extract_text_runs(el.inner.as_deref(), inherited)
                        }
                    };
                    if let Some(sub) = sub {
                        runs.extend(sub);
                    }
                }
            }
        }

        Some(runs)
    }

    /// Collect one run sequence per child element, for list items that wrap
    /// their text (`<li><p>..</p></li>`). Text children and items without
    /// any text are skipped.
    pub fn extract_list_item_runs(&self, inner: Option<&[RawNode]>) -> Vec<Vec<TextRun>> {
        inner
            .unwrap_or_default()
            .iter()
            .filter_map(|item| self.extract_text_runs(item.inner(), &[]))
            .filter(|runs| !runs.is_empty())
            .collect()
    }

    /// Classify a node into a logical block.
    ///
    /// `P` and `DIV` become paragraphs, and are dropped when they hold no
    /// text. `OL` and `UL` always become lists. Everything else, including
    /// bare text leaves, yields `None`.
    pub fn classify_element(&self, node: &RawNode) -> Option<LogicalBlock> {
        match node.node_type() {
            "#text" | "DIV" | "P" => {
                let text = self
                    .extract_text_runs(node.inner(), &[])
                    .unwrap_or_default();
                if text.is_empty() {
                    None
                } else {
                    Some(LogicalBlock::paragraph(text))
                }
            }
            "OL" => Some(LogicalBlock::ordered_list(
                self.extract_list_item_runs(node.inner()),
            )),
            "UL" => Some(LogicalBlock::unordered_list(
                self.extract_list_item_runs(node.inner()),
            )),
            _ => None,
        }
    }
}
