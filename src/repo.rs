//! The canvas repository capability trait.
//!
//! One contract, two interchangeable backends: [`crate::local`] for
//! single-user sessions and [`crate::room`] for multiplayer rooms. The
//! engine and dialogs are written against this trait only; whether a
//! session is collaborative is decided once, at composition time, by
//! which implementation gets injected.

use crate::camera::{Camera, Point};
use crate::code::{Code, CodeGroup, CodeId, GroupId, PartialCode};
use crate::node::{Node, NodeId, PartialNode};
use crate::presence::{ClientId, Presence};

/// Storage backend for one canvas session.
///
/// Mutations on the local backend apply in call order; on the replicated
/// backend they apply optimistically to the shared room state, whose
/// convergence across clients belongs to the replication substrate.
/// Presence operations are no-ops on the local backend.
pub trait CanvasRepository {
    // --- Nodes ---

    /// All nodes, in collection order.
    fn nodes(&self) -> Vec<Node>;

    /// Look up one node by id.
    fn node(&self, id: NodeId) -> Option<Node>;

    /// Append a node to the collection.
    fn insert_node(&mut self, node: Node);

    /// Shallow-merge fields into a node. No-op (false) if the id is absent.
    fn update_node(&mut self, id: NodeId, partial: &PartialNode) -> bool;

    /// Remove a node, returning it if present.
    fn remove_node(&mut self, id: NodeId) -> Option<Node>;

    // --- Codes ---

    fn codes(&self) -> Vec<Code>;

    fn code(&self, id: CodeId) -> Option<Code>;

    fn insert_code(&mut self, code: Code);

    fn update_code(&mut self, id: CodeId, partial: &PartialCode) -> bool;

    fn remove_code(&mut self, id: CodeId) -> Option<Code>;

    // --- Code groups ---

    fn code_groups(&self) -> Vec<CodeGroup>;

    fn insert_code_group(&mut self, group: CodeGroup);

    /// Rename a group. No-op (false) if the id is absent.
    fn update_code_group(&mut self, id: GroupId, name: &str) -> bool;

    fn remove_code_group(&mut self, id: GroupId) -> Option<CodeGroup>;

    /// Atomically replace both code collections (used by codebook import).
    fn replace_codebook(&mut self, codes: Vec<Code>, groups: Vec<CodeGroup>);

    // --- Camera ---

    /// The session's camera record.
    fn camera(&self) -> Camera;

    /// Store the camera record. The local backend persists it; the
    /// replicated backend keeps it client-local (cameras are per-user).
    fn set_camera(&mut self, camera: Camera);

    // --- Presence ---

    /// This client's connection id; `None` on the local backend.
    fn client_id(&self) -> Option<ClientId>;

    /// Broadcast the local cursor position. No-op on the local backend.
    fn publish_cursor(&mut self, cursor: Option<Point>);

    /// Broadcast which node this client is dragging (or that it stopped).
    /// No-op on the local backend.
    fn publish_drag(&mut self, node: Option<NodeId>);

    /// Presence of every other connected client. Empty on the local
    /// backend.
    fn presence_others(&self) -> Vec<Presence>;
}
