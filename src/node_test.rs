#![allow(clippy::float_cmp)]

use super::*;

// =============================================================
// Construction
// =============================================================

#[test]
fn new_text_node_has_default_size() {
    let node = Node::new_text(10.0, 20.0);
    assert_eq!(node.kind, NodeKind::Text);
    assert_eq!(node.width, TEXT_NODE_DEFAULT_WIDTH);
    assert_eq!(node.height, TEXT_NODE_DEFAULT_HEIGHT);
}

#[test]
fn new_text_node_starts_with_empty_paragraph() {
    let node = Node::new_text(0.0, 0.0);
    assert_eq!(node.text.as_deref(), Some("<p></p>"));
    let doc = node.structured.as_ref().unwrap();
    assert_eq!(doc.blocks.len(), 1);
    assert!(doc.blocks[0].spans.is_empty());
}

#[test]
fn text_and_structured_agree_at_creation() {
    let node = Node::new_text(0.0, 0.0);
    let doc = node.structured.as_ref().unwrap();
    assert_eq!(node.text.as_deref(), Some(doc.to_html().as_str()));
}

#[test]
fn new_file_node_has_empty_content() {
    let node = Node::new_file(1.0, 2.0, "interview.pdf", FileKind::Pdf);
    assert_eq!(node.kind, NodeKind::File);
    assert_eq!(node.file_name.as_deref(), Some("interview.pdf"));
    assert_eq!(node.file_kind, Some(FileKind::Pdf));
    assert!(node.content.is_none());
    assert!(node.text.is_none());
}

#[test]
fn node_ids_are_unique() {
    let a = Node::new_text(0.0, 0.0);
    let b = Node::new_text(0.0, 0.0);
    assert_ne!(a.id, b.id);
}

// =============================================================
// Display label
// =============================================================

#[test]
fn display_label_falls_back_to_kind() {
    let node = Node::new_text(0.0, 0.0);
    assert_eq!(node.display_label(), "text");
    let file = Node::new_file(0.0, 0.0, "a.png", FileKind::Image);
    assert_eq!(file.display_label(), "file");
}

#[test]
fn display_label_uses_label_when_set() {
    let mut node = Node::new_text(0.0, 0.0);
    node.label = Some("Memo 3".to_owned());
    assert_eq!(node.display_label(), "Memo 3");
}

#[test]
fn display_label_ignores_whitespace_label() {
    let mut node = Node::new_text(0.0, 0.0);
    node.label = Some("   ".to_owned());
    assert_eq!(node.display_label(), "text");
}

// =============================================================
// PartialNode
// =============================================================

#[test]
fn partial_at_moves_position_only() {
    let mut node = Node::new_text(0.0, 0.0);
    let before_w = node.width;
    PartialNode::at(50.0, -25.0).apply_to(&mut node);
    assert_eq!(node.x, 50.0);
    assert_eq!(node.y, -25.0);
    assert_eq!(node.width, before_w);
}

#[test]
fn partial_apply_clamps_width_and_height() {
    let mut node = Node::new_text(0.0, 0.0);
    let partial = PartialNode {
        width: Some(10_000.0),
        height: Some(1.0),
        ..PartialNode::default()
    };
    partial.apply_to(&mut node);
    assert_eq!(node.width, NODE_MAX_WIDTH);
    assert_eq!(node.height, NODE_MIN_HEIGHT);
}

#[test]
fn partial_empty_label_clears_label() {
    let mut node = Node::new_text(0.0, 0.0);
    node.label = Some("old".to_owned());
    let partial = PartialNode { label: Some(String::new()), ..PartialNode::default() };
    partial.apply_to(&mut node);
    assert!(node.label.is_none());
}

#[test]
fn partial_absent_fields_do_not_change_node() {
    let mut node = Node::new_file(3.0, 4.0, "x.txt", FileKind::Text);
    let snapshot = node.clone();
    PartialNode::default().apply_to(&mut node);
    assert_eq!(node, snapshot);
}

#[test]
fn partial_serializes_only_present_fields() {
    let json = serde_json::to_string(&PartialNode::at(1.0, 2.0)).unwrap();
    assert!(json.contains("\"x\""));
    assert!(!json.contains("width"));
    assert!(!json.contains("label"));
}

// =============================================================
// Serde
// =============================================================

#[test]
fn node_serde_round_trip() {
    let mut node = Node::new_file(7.0, 8.0, "photo.png", FileKind::Image);
    node.content = Some("data:image/png;base64,AAAA".to_owned());
    let json = serde_json::to_string(&node).unwrap();
    let restored: Node = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, node);
}

#[test]
fn node_kind_serializes_lowercase() {
    let json = serde_json::to_string(&NodeKind::File).unwrap();
    assert_eq!(json, "\"file\"");
}

#[test]
fn rect_matches_position_and_size() {
    let node = Node::new_text(5.0, 6.0);
    let rect = node.rect();
    assert_eq!(rect.x, 5.0);
    assert_eq!(rect.y, 6.0);
    assert_eq!(rect.width, node.width);
    assert_eq!(rect.height, node.height);
}
