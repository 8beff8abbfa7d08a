//! DOM ingestion: host DOM nodes → [`RawNode`] tree.
//!
//! Tag names are uppercased so the classifier can match them exactly. No tag
//! is rejected here; legality is the parser's business.

use crate::dom::DomNode;
use crate::model::{Attribute, RawElement, RawNode};

/// Ingest a host node list, preserving order.
pub fn ingest(nodes: &[DomNode]) -> Vec<RawNode> {
    nodes.iter().map(ingest_node).collect()
}

fn ingest_node(node: &DomNode) -> RawNode {
    if node.is_text() {
        return RawNode::Text(node.data.clone().unwrap_or_default());
    }

    let inner = if node.child_nodes.is_empty() {
        None
    } else {
        Some(ingest(&node.child_nodes))
    };

    RawNode::Element(RawElement {
        tag_name: node.node_name.to_ascii_uppercase(),
        attributes: node
            .attributes
            .iter()
            .map(|(name, value)| Attribute {
                name: name.clone(),
                value: value.clone(),
            })
            .collect(),
        inner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_text_leaf_is_raw() {
        let raw = ingest(&[DomNode::text("  spaced  ")]);
        assert_eq!(raw, vec![RawNode::Text("  spaced  ".to_string())]);
    }

    #[test]
    fn test_ingest_uppercases_tag_and_keeps_attributes() {
        let dom = DomNode::element("strong", vec![DomNode::text("x")])
            .with_attribute("class", "a")
            .with_attribute("title", "b");
        let raw = ingest(&[dom]);
        let RawNode::Element(el) = &raw[0] else {
            panic!("expected element");
        };
        assert_eq!(el.tag_name, "STRONG");
        assert_eq!(el.attributes.len(), 2);
        assert_eq!(el.attributes[0].name, "class");
        assert_eq!(el.attributes[1].value, "b");
        assert_eq!(el.inner, Some(vec![RawNode::Text("x".to_string())]));
    }

    #[test]
    fn test_ingest_childless_element_has_no_inner() {
        let raw = ingest(&[DomNode::element("br", vec![])]);
        assert_eq!(raw[0].node_type(), "BR");
        assert!(raw[0].inner().is_none());
    }

    #[test]
    fn test_ingest_preserves_order_and_nesting() {
        let dom = vec![
            DomNode::element("p", vec![DomNode::text("a")]),
            DomNode::text("\n"),
            DomNode::element(
                "ul",
                vec![DomNode::element("li", vec![DomNode::text("b")])],
            ),
        ];
        let raw = ingest(&dom);
        let types: Vec<&str> = raw.iter().map(RawNode::node_type).collect();
        assert_eq!(types, vec!["P", "#text", "UL"]);
        let li = &raw[2].inner().unwrap()[0];
        assert_eq!(li.node_type(), "LI");
    }

    #[test]
    fn test_ingest_unknown_tags_pass_through() {
        let raw = ingest(&[DomNode::element("x-custom", vec![])]);
        assert_eq!(raw[0].node_type(), "X-CUSTOM");
    }
}
