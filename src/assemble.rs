//! Stack assembly and per-descriptor settings.
//!
//! [`build_stack`] walks the ingested tree depth-first. Every node that
//! classifies into a block is pushed onto the stack with the settings
//! applied, and every element is then walked for further blocks, whether or
//! not it was classified itself. A `DIV` wrapping `P`s therefore yields the
//! `DIV` paragraph followed by each `P` paragraph.

use serde_json::{Map, Value};

use crate::extract::TagTable;
use crate::model::{LogicalBlock, RawNode, Stack};

/// Applies one setting value to a block.
pub type SettingsEffect = fn(&mut LogicalBlock, &Value);

/// Registered settings, keyed by option name.
#[derive(Debug, Clone)]
pub struct SettingsTable {
    effects: Vec<(String, SettingsEffect)>,
}

impl Default for SettingsTable {
    fn default() -> Self {
        let mut table = SettingsTable::empty();
        table.register("verticalOffset", vertical_offset);
        table
    }
}

impl SettingsTable {
    pub fn empty() -> Self {
        SettingsTable {
            effects: Vec::new(),
        }
    }

    /// Register an effect, replacing any effect with the same name.
    pub fn register(&mut self, name: &str, effect: SettingsEffect) -> &mut Self {
        match self.effects.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = effect,
            None => self.effects.push((name.to_string(), effect)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<SettingsEffect> {
        self.effects
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, effect)| *effect)
    }

    /// Run the effect of every recognized key in `settings` on `block`.
    /// Unknown keys are ignored.
    pub fn apply(&self, settings: &Map<String, Value>, block: &mut LogicalBlock) {
        for (key, value) in settings {
            match self.get(key) {
                Some(effect) => effect(block, value),
                None => log::trace!("ignoring unknown setting '{}'", key),
            }
        }
    }
}

/// `verticalOffset`: bottom margin of `[0, 0, 0, offset]`. Values that do not
/// start with a number leave the block untouched.
fn vertical_offset(block: &mut LogicalBlock, value: &Value) {
    if let Some(offset) = parse_offset(value) {
        block.margin = Some([0.0, 0.0, 0.0, offset]);
    }
}

fn parse_offset(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_float_prefix(s),
        _ => None,
    }
}

/// Parse the longest decimal number at the start of `s`, after leading
/// whitespace: `"12px"` → 12, `" -1.5e2x"` → -150, `"px12"` → `None`.
fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Assemble the stack of blocks for an ingested tree.
pub fn build_stack(
    tree: &[RawNode],
    settings: &Map<String, Value>,
    tags: &TagTable,
    effects: &SettingsTable,
) -> Stack {
    let mut stack = Stack::default();
    collect_blocks(tree, settings, tags, effects, &mut stack);
    stack
}

fn collect_blocks(
    nodes: &[RawNode],
    settings: &Map<String, Value>,
    tags: &TagTable,
    effects: &SettingsTable,
    stack: &mut Stack,
) {
    for node in nodes {
        if let Some(mut block) = tags.classify_element(node) {
            effects.apply(settings, &mut block);
            stack.stack.push(block);
        }
        if let Some(inner) = node.inner() {
            collect_blocks(inner, settings, tags, effects, stack);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockContent, RawElement, TextRun};
    use serde_json::json;

    fn text(s: &str) -> RawNode {
        RawNode::Text(s.to_string())
    }

    fn el(tag: &str, children: Vec<RawNode>) -> RawNode {
        RawNode::Element(RawElement {
            tag_name: tag.to_string(),
            attributes: vec![],
            inner: Some(children),
        })
    }

    fn settings(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap_or_default()
    }

    fn block() -> LogicalBlock {
        LogicalBlock::paragraph(vec![TextRun::new("x")])
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float_prefix("12"), Some(12.0));
        assert_eq!(parse_float_prefix("  12.5px"), Some(12.5));
        assert_eq!(parse_float_prefix("-3"), Some(-3.0));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("5."), Some(5.0));
        assert_eq!(parse_float_prefix("1e2"), Some(100.0));
        assert_eq!(parse_float_prefix("1e"), Some(1.0));
        assert_eq!(parse_float_prefix("abc"), None);
        assert_eq!(parse_float_prefix(""), None);
        assert_eq!(parse_float_prefix("-"), None);
        assert_eq!(parse_float_prefix("."), None);
    }

    #[test]
    fn test_vertical_offset_sets_bottom_margin() {
        let mut b = block();
        SettingsTable::default().apply(&settings(json!({"verticalOffset": "12"})), &mut b);
        assert_eq!(b.margin, Some([0.0, 0.0, 0.0, 12.0]));
    }

    #[test]
    fn test_vertical_offset_accepts_numbers() {
        let mut b = block();
        SettingsTable::default().apply(&settings(json!({"verticalOffset": 7.5})), &mut b);
        assert_eq!(b.margin, Some([0.0, 0.0, 0.0, 7.5]));
    }

    #[test]
    fn test_vertical_offset_unparseable_is_noop() {
        let table = SettingsTable::default();
        for value in [json!("abc"), json!(null), json!(true), json!({"a": 1})] {
            let mut b = block();
            table.apply(&settings(json!({ "verticalOffset": value })), &mut b);
            assert_eq!(b.margin, None);
            assert!(b.to_value().get("margin").is_none());
        }
    }

    #[test]
    fn test_unknown_settings_are_ignored() {
        let mut b = block();
        SettingsTable::default().apply(&settings(json!({"fontSize": 40, "x": "y"})), &mut b);
        assert_eq!(b, block());
    }

    #[test]
    fn test_register_custom_effect() {
        fn zero_margin(block: &mut LogicalBlock, _: &Value) {
            block.margin = Some([0.0; 4]);
        }
        let mut table = SettingsTable::empty();
        assert!(table.get("verticalOffset").is_none());
        table.register("flush", zero_margin);
        let mut b = block();
        table.apply(&settings(json!({"flush": true})), &mut b);
        assert_eq!(b.margin, Some([0.0; 4]));
    }

    #[test]
    fn test_build_stack_in_document_order() {
        let tree = vec![
            el("P", vec![text("one")]),
            text("\n"),
            el("UL", vec![el("LI", vec![text("item")])]),
            el("P", vec![text("two")]),
        ];
        let stack = build_stack(&tree, &Map::new(), &TagTable::default(), &SettingsTable::default());
        assert_eq!(stack.len(), 3);
        assert_eq!(
            stack.stack[0].content,
            BlockContent::Paragraph { text: vec![TextRun::new("one")] }
        );
        assert_eq!(
            stack.stack[1].content,
            BlockContent::UnorderedList { ul: vec![vec![TextRun::new("item")]] }
        );
        assert_eq!(
            stack.stack[2].content,
            BlockContent::Paragraph { text: vec![TextRun::new("two")] }
        );
    }

    #[test]
    fn test_build_stack_applies_settings_to_every_block() {
        let tree = vec![el("P", vec![text("a")]), el("P", vec![text("b")])];
        let stack = build_stack(
            &tree,
            &settings(json!({"verticalOffset": "4"})),
            &TagTable::default(),
            &SettingsTable::default(),
        );
        assert!(stack.stack.iter().all(|b| b.margin == Some([0.0, 0.0, 0.0, 4.0])));
    }

    #[test]
    fn test_build_stack_classifies_container_and_descendants() {
        let tree = vec![el(
            "DIV",
            vec![el("P", vec![text("a")]), el("P", vec![text("b")])],
        )];
        let stack = build_stack(&tree, &Map::new(), &TagTable::default(), &SettingsTable::default());
        let texts: Vec<Value> = stack.stack.iter().map(LogicalBlock::to_value).collect();
        assert_eq!(
            texts,
            vec![
                json!({"text": [{"text": "a"}, {"text": "b"}]}),
                json!({"text": [{"text": "a"}]}),
                json!({"text": [{"text": "b"}]}),
            ]
        );
    }

    #[test]
    fn test_build_stack_finds_blocks_under_unrecognized_containers() {
        let tree = vec![el("SECTION", vec![el("P", vec![text("deep")])])];
        let stack = build_stack(&tree, &Map::new(), &TagTable::default(), &SettingsTable::default());
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_build_stack_list_items_also_surface_their_paragraphs() {
        let tree = vec![el("OL", vec![el("LI", vec![el("P", vec![text("a")])])])];
        let stack = build_stack(&tree, &Map::new(), &TagTable::default(), &SettingsTable::default());
        let nodes: Vec<Value> = stack.stack.iter().map(LogicalBlock::to_value).collect();
        assert_eq!(
            nodes,
            vec![json!({"ol": [[{"text": "a"}]]}), json!({"text": [{"text": "a"}]})]
        );
    }

    #[test]
    fn test_build_stack_empty_tree() {
        let stack = build_stack(&[], &Map::new(), &TagTable::default(), &SettingsTable::default());
        assert!(stack.is_empty());
    }
}
