#![allow(clippy::float_cmp)]

use super::*;
use crate::node::{FileKind, NodeKind};

fn repo() -> LocalRepository {
    LocalRepository::in_memory()
}

fn text_node() -> Node {
    Node::new_text(10.0, 20.0)
}

// =============================================================
// Node CRUD
// =============================================================

#[test]
fn insert_and_get_node() {
    let mut repo = repo();
    let node = text_node();
    repo.insert_node(node.clone());
    assert_eq!(repo.node(node.id), Some(node));
    assert_eq!(repo.nodes().len(), 1);
}

#[test]
fn update_node_merges_fields() {
    let mut repo = repo();
    let node = text_node();
    repo.insert_node(node.clone());
    assert!(repo.update_node(node.id, &PartialNode::at(99.0, -1.0)));
    let stored = repo.node(node.id).unwrap();
    assert_eq!(stored.x, 99.0);
    assert_eq!(stored.y, -1.0);
}

#[test]
fn update_absent_node_is_noop() {
    let mut repo = repo();
    assert!(!repo.update_node(uuid::Uuid::new_v4(), &PartialNode::at(0.0, 0.0)));
}

#[test]
fn remove_node_returns_it() {
    let mut repo = repo();
    let node = text_node();
    repo.insert_node(node.clone());
    let removed = repo.remove_node(node.id).unwrap();
    assert_eq!(removed.id, node.id);
    assert!(repo.nodes().is_empty());
}

#[test]
fn node_ids_are_unique_in_store() {
    let mut repo = repo();
    let a = text_node();
    let b = text_node();
    repo.insert_node(a.clone());
    repo.insert_node(b);
    repo.remove_node(a.id);
    assert!(repo.nodes().iter().all(|n| n.id != a.id));
}

// =============================================================
// Code and group CRUD
// =============================================================

#[test]
fn code_crud_round_trip() {
    let mut repo = repo();
    let code = Code::new("trust", "#E53935").unwrap();
    repo.insert_code(code.clone());
    let partial = PartialCode { color: Some("#000000".to_owned()), ..PartialCode::default() };
    assert!(repo.update_code(code.id, &partial));
    assert_eq!(repo.code(code.id).unwrap().color, "#000000");
    assert!(repo.remove_code(code.id).is_some());
    assert!(repo.codes().is_empty());
}

#[test]
fn group_rename() {
    let mut repo = repo();
    let group = CodeGroup::new("Emotions").unwrap();
    repo.insert_code_group(group.clone());
    assert!(repo.update_code_group(group.id, "Feelings"));
    assert_eq!(repo.code_groups()[0].name, "Feelings");
}

#[test]
fn replace_codebook_swaps_both_collections() {
    let mut repo = repo();
    repo.insert_code(Code::new("old", "#111111").unwrap());
    let group = CodeGroup::new("New Group").unwrap();
    let mut code = Code::new("new", "#222222").unwrap();
    code.group_id = Some(group.id);
    repo.replace_codebook(vec![code], vec![group]);
    assert_eq!(repo.codes().len(), 1);
    assert_eq!(repo.codes()[0].name, "new");
    assert_eq!(repo.code_groups().len(), 1);
}

// =============================================================
// Persistence
// =============================================================

#[test]
fn collections_survive_reopen() {
    let mut store = MemoryStore::new();
    {
        let mut first = LocalRepository::open(Box::new(MemoryStore::new()));
        let node = Node::new_file(1.0, 2.0, "a.pdf", FileKind::Pdf);
        first.insert_node(node);
        first.insert_code(Code::new("trust", "#E53935").unwrap());
        // Copy the snapshots the first session wrote.
        for key in ["nodes", "codes", "codeGroups", "viewport"] {
            if let Ok(Some(json)) = first.store.load(key) {
                store.store(key, &json).unwrap();
            }
        }
    }
    let second = LocalRepository::open(Box::new(store));
    assert_eq!(second.nodes().len(), 1);
    assert_eq!(second.nodes()[0].kind, NodeKind::File);
    assert_eq!(second.codes().len(), 1);
    assert_eq!(second.codes()[0].name, "trust");
}

#[test]
fn camera_persists_across_reopen() {
    let mut store = MemoryStore::new();
    {
        let mut first = LocalRepository::in_memory();
        first.set_camera(Camera { pan_x: 12.0, pan_y: -8.0, scale: 2.0 });
        if let Ok(Some(json)) = first.store.load("viewport") {
            store.store("viewport", &json).unwrap();
        }
    }
    let second = LocalRepository::open(Box::new(store));
    assert_eq!(second.camera().scale, 2.0);
    assert_eq!(second.camera().pan_x, 12.0);
}

#[test]
fn corrupt_snapshot_degrades_to_default() {
    let mut store = MemoryStore::new();
    store.store("nodes", "not json at all").unwrap();
    let repo = LocalRepository::open(Box::new(store));
    assert!(repo.nodes().is_empty());
}

#[test]
fn fresh_store_opens_empty() {
    let repo = repo();
    assert!(repo.nodes().is_empty());
    assert!(repo.codes().is_empty());
    assert!(repo.code_groups().is_empty());
    assert_eq!(repo.camera(), Camera::default());
}

// =============================================================
// Presence is inert on the local backend
// =============================================================

#[test]
fn local_backend_has_no_presence() {
    let mut repo = repo();
    assert!(repo.client_id().is_none());
    repo.publish_cursor(Some(Point::new(1.0, 2.0)));
    repo.publish_drag(Some(uuid::Uuid::new_v4()));
    assert!(repo.presence_others().is_empty());
}
