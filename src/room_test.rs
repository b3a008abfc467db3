#![allow(clippy::float_cmp)]

use super::*;

fn two_clients() -> (RoomHub, RoomClient, RoomClient) {
    let hub = RoomHub::new();
    let a = hub.connect("Ada", "#E53935");
    let b = hub.connect("Grace", "#1E88E5");
    (hub, a, b)
}

// =============================================================
// Shared durable state
// =============================================================

#[test]
fn insert_is_visible_to_other_clients() {
    let (_hub, mut a, b) = two_clients();
    let node = Node::new_text(5.0, 6.0);
    a.insert_node(node.clone());
    assert_eq!(b.node(node.id), Some(node));
}

#[test]
fn update_is_visible_to_other_clients() {
    let (_hub, mut a, mut b) = two_clients();
    let node = Node::new_text(0.0, 0.0);
    a.insert_node(node.clone());
    assert!(b.update_node(node.id, &PartialNode::at(40.0, 50.0)));
    let seen = a.node(node.id).unwrap();
    assert_eq!(seen.x, 40.0);
    assert_eq!(seen.y, 50.0);
}

#[test]
fn remove_is_visible_to_other_clients() {
    let (_hub, mut a, mut b) = two_clients();
    let node = Node::new_text(0.0, 0.0);
    a.insert_node(node.clone());
    assert!(b.remove_node(node.id).is_some());
    assert!(a.node(node.id).is_none());
    assert!(a.nodes().is_empty());
}

#[test]
fn update_relocates_target_after_concurrent_removal() {
    // A remembers nothing about positions: B removes an earlier entry,
    // shifting the list, and A's update still lands on the right node.
    let (_hub, mut a, mut b) = two_clients();
    let first = Node::new_text(0.0, 0.0);
    let second = Node::new_text(10.0, 10.0);
    a.insert_node(first.clone());
    a.insert_node(second.clone());
    b.remove_node(first.id);
    assert!(a.update_node(second.id, &PartialNode::at(99.0, 99.0)));
    assert_eq!(b.node(second.id).unwrap().x, 99.0);
}

#[test]
fn codes_are_shared() {
    let (_hub, mut a, b) = two_clients();
    let code = Code::new("trust", "#E53935").unwrap();
    a.insert_code(code.clone());
    assert_eq!(b.codes().len(), 1);
    assert_eq!(b.code(code.id).unwrap().name, "trust");
}

#[test]
fn code_groups_are_shared() {
    let (_hub, mut a, b) = two_clients();
    let group = CodeGroup::new("Emotions").unwrap();
    a.insert_code_group(group.clone());
    assert!(b.code_groups().iter().any(|g| g.id == group.id));
}

#[test]
fn replace_codebook_is_shared() {
    let (_hub, mut a, b) = two_clients();
    a.insert_code(Code::new("old", "#111111").unwrap());
    a.replace_codebook(vec![Code::new("new", "#222222").unwrap()], Vec::new());
    assert_eq!(b.codes().len(), 1);
    assert_eq!(b.codes()[0].name, "new");
}

// =============================================================
// Camera stays client-local
// =============================================================

#[test]
fn camera_is_not_shared() {
    let (_hub, mut a, b) = two_clients();
    a.set_camera(Camera { pan_x: 100.0, pan_y: 0.0, scale: 2.0 });
    assert_eq!(b.camera(), Camera::default());
    assert_eq!(a.camera().scale, 2.0);
}

// =============================================================
// Presence
// =============================================================

#[test]
fn clients_have_distinct_ids() {
    let (_hub, a, b) = two_clients();
    assert_ne!(a.client_id(), b.client_id());
    assert!(a.client_id().is_some());
}

#[test]
fn others_excludes_self() {
    let (_hub, a, _b) = two_clients();
    let others = a.presence_others();
    assert_eq!(others.len(), 1);
    assert_eq!(others[0].name, "Grace");
}

#[test]
fn cursor_broadcast_reaches_others() {
    let (_hub, mut a, b) = two_clients();
    a.publish_cursor(Some(Point::new(3.0, 4.0)));
    let others = b.presence_others();
    assert_eq!(others[0].cursor, Some(Point::new(3.0, 4.0)));
}

#[test]
fn drag_claim_reaches_others() {
    let (_hub, mut a, b) = two_clients();
    let node_id = uuid::Uuid::new_v4();
    a.publish_drag(Some(node_id));
    assert_eq!(b.presence_others()[0].node_being_dragged, Some(node_id));
    a.publish_drag(None);
    assert_eq!(b.presence_others()[0].node_being_dragged, None);
}

#[test]
fn last_presence_value_wins() {
    let (_hub, mut a, b) = two_clients();
    a.publish_cursor(Some(Point::new(1.0, 1.0)));
    a.publish_cursor(Some(Point::new(2.0, 2.0)));
    let others = b.presence_others();
    assert_eq!(others.len(), 1);
    assert_eq!(others[0].cursor, Some(Point::new(2.0, 2.0)));
}

#[test]
fn presence_evaporates_on_disconnect() {
    let hub = RoomHub::new();
    let a = hub.connect("Ada", "#E53935");
    {
        let mut b = hub.connect("Grace", "#1E88E5");
        b.publish_cursor(Some(Point::new(1.0, 1.0)));
        assert_eq!(a.presence_others().len(), 1);
        assert_eq!(hub.client_count(), 2);
    }
    // B's handle dropped: its presence is gone, durable state remains.
    assert!(a.presence_others().is_empty());
    assert_eq!(hub.client_count(), 1);
}

#[test]
fn durable_state_survives_disconnect() {
    let hub = RoomHub::new();
    let a = hub.connect("Ada", "#E53935");
    let node = {
        let mut b = hub.connect("Grace", "#1E88E5");
        let node = Node::new_text(0.0, 0.0);
        b.insert_node(node.clone());
        node
    };
    assert_eq!(a.node(node.id).map(|n| n.id), Some(node.id));
}

// =============================================================
// Transactions
// =============================================================

#[test]
fn transact_reads_current_state() {
    let (_hub, mut a, b) = two_clients();
    a.insert_node(Node::new_text(0.0, 0.0));
    let count = b.transact(|room| room.nodes.len());
    assert_eq!(count, 1);
}
