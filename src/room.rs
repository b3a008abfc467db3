//! Replicated backend: shared room state plus ephemeral presence.
//!
//! DESIGN
//! ======
//! Durable state (nodes, codes, code groups) lives in ordered lists
//! shared by every client in the room. The replication substrate is an
//! external collaborator; its contract of optimistic local mutation
//! with eventual field-granular last-writer-wins convergence is exactly
//! what [`RoomHub`] provides in-process, so the engine and tests can
//! exercise multi-client sessions without a transport.
//!
//! Every mutation runs as a transaction closure that re-locates its
//! target by id scan. Cached indices are never trusted: a concurrent
//! remote edit can move entries between renders. Two concurrent
//! transactions touching the same list by index can still interleave
//! unexpectedly; that hazard belongs to the substrate's semantics and is
//! documented here rather than patched over.
//!
//! Presence (cursor, identity color/name, node being dragged) is a
//! separate ephemeral channel: per-client last value wins, nothing is
//! persisted, and a client's entry is evicted when its handle drops.

#[cfg(test)]
#[path = "room_test.rs"]
mod room_test;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;
use uuid::Uuid;

use crate::camera::{Camera, Point};
use crate::code::{Code, CodeGroup, CodeId, GroupId, PartialCode};
use crate::node::{Node, NodeId, PartialNode};
use crate::presence::{ClientId, Presence};
use crate::repo::CanvasRepository;

/// Shared durable state plus the presence map for one room.
#[derive(Debug, Default)]
pub struct RoomState {
    pub nodes: Vec<Node>,
    pub codes: Vec<Code>,
    pub code_groups: Vec<CodeGroup>,
    presence: Vec<Presence>,
}

/// One room, shared by every connected client.
#[derive(Debug, Clone, Default)]
pub struct RoomHub {
    state: Rc<RefCell<RoomState>>,
}

impl RoomHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a client to the room, announcing its presence identity.
    #[must_use]
    pub fn connect(&self, name: &str, color: &str) -> RoomClient {
        let client_id = Uuid::new_v4();
        self.state
            .borrow_mut()
            .presence
            .push(Presence::new(client_id, name, color));
        debug!(%client_id, name, "client connected to room");
        RoomClient {
            state: Rc::clone(&self.state),
            client_id,
            camera: Camera::default(),
        }
    }

    /// Number of currently connected clients.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.state.borrow().presence.len()
    }
}

/// One client's handle on a shared room.
///
/// Implements [`CanvasRepository`] over the shared state; the camera is
/// deliberately client-local (each user pans and zooms independently —
/// remote cameras are a presence concern, not durable state).
pub struct RoomClient {
    state: Rc<RefCell<RoomState>>,
    client_id: ClientId,
    camera: Camera,
}

impl RoomClient {
    /// Run a transaction against the shared room state.
    ///
    /// The closure must locate any entry it touches by id scan, never by
    /// a position remembered from an earlier read.
    pub fn transact<T>(&self, f: impl FnOnce(&mut RoomState) -> T) -> T {
        f(&mut self.state.borrow_mut())
    }

    fn update_presence(&self, f: impl FnOnce(&mut Presence)) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state
            .presence
            .iter_mut()
            .find(|p| p.client_id == self.client_id)
        {
            f(entry);
        }
    }
}

impl Drop for RoomClient {
    fn drop(&mut self) {
        // Presence evaporates on disconnect.
        let mut state = self.state.borrow_mut();
        state.presence.retain(|p| p.client_id != self.client_id);
        debug!(client_id = %self.client_id, "client disconnected from room");
    }
}

impl CanvasRepository for RoomClient {
    fn nodes(&self) -> Vec<Node> {
        self.state.borrow().nodes.clone()
    }

    fn node(&self, id: NodeId) -> Option<Node> {
        self.state.borrow().nodes.iter().find(|n| n.id == id).cloned()
    }

    fn insert_node(&mut self, node: Node) {
        self.transact(|room| room.nodes.push(node));
    }

    fn update_node(&mut self, id: NodeId, partial: &PartialNode) -> bool {
        self.transact(|room| {
            // Re-locate by id: remote edits may have moved the entry.
            match room.nodes.iter_mut().find(|n| n.id == id) {
                Some(node) => {
                    partial.apply_to(node);
                    true
                }
                None => false,
            }
        })
    }

    fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        self.transact(|room| {
            let pos = room.nodes.iter().position(|n| n.id == id)?;
            Some(room.nodes.remove(pos))
        })
    }

    fn codes(&self) -> Vec<Code> {
        self.state.borrow().codes.clone()
    }

    fn code(&self, id: CodeId) -> Option<Code> {
        self.state.borrow().codes.iter().find(|c| c.id == id).cloned()
    }

    fn insert_code(&mut self, code: Code) {
        self.transact(|room| room.codes.push(code));
    }

    fn update_code(&mut self, id: CodeId, partial: &PartialCode) -> bool {
        self.transact(|room| match room.codes.iter_mut().find(|c| c.id == id) {
            Some(code) => {
                partial.apply_to(code);
                true
            }
            None => false,
        })
    }

    fn remove_code(&mut self, id: CodeId) -> Option<Code> {
        self.transact(|room| {
            let pos = room.codes.iter().position(|c| c.id == id)?;
            Some(room.codes.remove(pos))
        })
    }

    fn code_groups(&self) -> Vec<CodeGroup> {
        self.state.borrow().code_groups.clone()
    }

    fn insert_code_group(&mut self, group: CodeGroup) {
        self.transact(|room| room.code_groups.push(group));
    }

    fn update_code_group(&mut self, id: GroupId, name: &str) -> bool {
        self.transact(|room| {
            match room.code_groups.iter_mut().find(|g| g.id == id) {
                Some(group) => {
                    group.name = name.to_owned();
                    true
                }
                None => false,
            }
        })
    }

    fn remove_code_group(&mut self, id: GroupId) -> Option<CodeGroup> {
        self.transact(|room| {
            let pos = room.code_groups.iter().position(|g| g.id == id)?;
            Some(room.code_groups.remove(pos))
        })
    }

    fn replace_codebook(&mut self, codes: Vec<Code>, groups: Vec<CodeGroup>) {
        self.transact(|room| {
            room.codes = codes;
            room.code_groups = groups;
        });
    }

    fn camera(&self) -> Camera {
        self.camera
    }

    fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    fn client_id(&self) -> Option<ClientId> {
        Some(self.client_id)
    }

    fn publish_cursor(&mut self, cursor: Option<Point>) {
        self.update_presence(|p| p.cursor = cursor);
    }

    fn publish_drag(&mut self, node: Option<NodeId>) {
        self.update_presence(|p| p.node_being_dragged = node);
    }

    fn presence_others(&self) -> Vec<Presence> {
        self.state
            .borrow()
            .presence
            .iter()
            .filter(|p| p.client_id != self.client_id)
            .cloned()
            .collect()
    }
}
