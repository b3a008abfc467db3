//! Top-level canvas engine.
//!
//! Owns the injected repository backend, the ephemeral session state,
//! the gesture state machine, the document registry, and the blob-store
//! handle. Translates raw input events into camera math and store
//! mutations, and hosts the entity operations whose policy must not be
//! duplicated per backend: placement, referential cleanup, group
//! deletion policies, and code-deletion mark cleanup.
//!
//! The host wires input events in and processes the returned [`Action`]s
//! (re-render, node updates to echo into its UI). Which backend the
//! engine runs on, local or replicated, is decided once at construction;
//! nothing in here branches on it.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use rand::Rng;
use tracing::warn;

use crate::camera::{Camera, Point};
use crate::code::{Code, CodeGroup, CodeId, GroupDeletePolicy, GroupId, PartialCode};
use crate::consts::{BUTTON_ZOOM_STEP, PLACEMENT_MARGIN_RATIO, WHEEL_ZOOM_RATE};
use crate::exchange::{self, Codebook, CodebookFormat, ExchangeError};
use crate::files::{BlobStore, DecodeError, NullBlobStore};
use crate::input::{Gesture, Modifiers, WheelDelta};
use crate::marks::{CodeSelection, DocRegistry};
use crate::node::{FileKind, Node, NodeId, NodeKind, PartialNode};
use crate::repo::CanvasRepository;
use crate::rich::Document;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone)]
pub enum Action {
    /// A node changed; in replicated mode the update is already visible
    /// to other clients.
    NodeUpdated { id: NodeId, fields: PartialNode },
    /// The scene needs repainting.
    RenderNeeded,
}

/// Ephemeral per-session interaction state. Never persisted; the
/// persisted view state is the camera record alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionState {
    /// Node designated by the active drag. Cleared on pointer-up.
    pub selected_node_id: Option<NodeId>,
    /// Most recently interacted node; drives z-ordering. Survives
    /// pointer-up.
    pub last_selected_node_id: Option<NodeId>,
    /// Node in full-screen focus mode. Mutually exclusive with pan mode.
    pub expanded_node_id: Option<NodeId>,
    /// Whether pointer-down pans the canvas instead of selecting.
    pub pan_mode: bool,
}

/// The canvas engine, generic over the injected storage backend.
pub struct Engine<R: CanvasRepository> {
    pub repo: R,
    pub session: SessionState,
    pub gesture: Gesture,
    pub registry: DocRegistry,
    blobs: Box<dyn BlobStore>,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl<R: CanvasRepository> Engine<R> {
    /// Create an engine over a backend, with no out-of-band blob store.
    #[must_use]
    pub fn new(repo: R) -> Self {
        Self::with_blob_store(repo, Box::new(NullBlobStore))
    }

    /// Create an engine over a backend and a blob store for file payloads.
    #[must_use]
    pub fn with_blob_store(repo: R, blobs: Box<dyn BlobStore>) -> Self {
        Self {
            repo,
            session: SessionState::default(),
            gesture: Gesture::Idle,
            registry: DocRegistry::new(),
            blobs,
            viewport_width: 0.0,
            viewport_height: 0.0,
        }
    }

    /// Update the viewport dimensions (screen pixels).
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport_width = width;
        self.viewport_height = height;
    }

    // --- Camera ---

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.repo.camera()
    }

    /// Button zoom: scales around the implicit origin, pan unchanged.
    pub fn zoom_in(&mut self) {
        let cam = self.camera().zoom_by(BUTTON_ZOOM_STEP, None);
        self.repo.set_camera(cam);
    }

    /// Button zoom out.
    pub fn zoom_out(&mut self) {
        let cam = self.camera().zoom_by(1.0 / BUTTON_ZOOM_STEP, None);
        self.repo.set_camera(cam);
    }

    /// Fit all nodes in the viewport ("reset view"). With no nodes the
    /// camera returns to the default.
    pub fn reset_view(&mut self) {
        let rects: Vec<_> = self.repo.nodes().iter().map(Node::rect).collect();
        let cam = Camera::fit_to_content(&rects, self.viewport_width, self.viewport_height);
        self.repo.set_camera(cam);
    }

    /// Restore the default camera and clear the selection markers.
    pub fn reset_to_default(&mut self) {
        self.repo.set_camera(Camera::default());
        self.session.selected_node_id = None;
        self.session.last_selected_node_id = None;
        self.session.expanded_node_id = None;
    }

    // --- Node operations ---

    /// Create a text node at a random point inside the visible viewport
    /// (10% margin per edge), selected, with empty-paragraph content. Its
    /// document handle is registered immediately, as the editor opens on
    /// creation.
    pub fn add_text_node(&mut self) -> Node {
        let (width, height) = NodeKind::Text.default_size();
        let at = self.place(width, height);
        let node = Node::new_text(at.x, at.y);
        self.repo.insert_node(node.clone());
        self.registry.register(node.id, Document::empty_paragraph());
        self.select_node(node.id);
        node
    }

    /// Create a file node with the same placement policy. Content starts
    /// empty and resolves later via [`Engine::resolve_file_content`];
    /// creation never blocks on decoding.
    pub fn add_file_node(&mut self, file_name: &str, kind: FileKind) -> Node {
        let (width, height) = NodeKind::File.default_size();
        let at = self.place(width, height);
        let node = Node::new_file(at.x, at.y, file_name, kind);
        self.repo.insert_node(node.clone());
        self.select_node(node.id);
        node
    }

    /// Report a finished decode for a file node. On success the payload
    /// is stored out-of-band and mirrored onto the node; on failure the
    /// node keeps its empty content (file nodes never vanish silently).
    /// A resolve arriving after the node was deleted is a no-op.
    pub fn resolve_file_content(
        &mut self,
        id: NodeId,
        result: Result<String, DecodeError>,
    ) -> bool {
        match result {
            Ok(content) => {
                if let Err(err) = self.blobs.put(id, &content) {
                    warn!(node = %id, error = %err, "blob write failed; content kept inline only");
                }
                let fields = PartialNode { content: Some(content), ..PartialNode::default() };
                self.repo.update_node(id, &fields)
            }
            Err(err) => {
                warn!(node = %id, error = %err, "file decode failed; node keeps empty content");
                false
            }
        }
    }

    /// Shallow-merge fields into a node. No-op if the id is absent.
    pub fn update_node(&mut self, id: NodeId, partial: &PartialNode) -> bool {
        self.repo.update_node(id, partial)
    }

    /// Delete a node: removes it from the store, releases any out-of-band
    /// blob (failure logged, not surfaced), drops its document handle,
    /// and clears selection state referencing it.
    pub fn delete_node(&mut self, id: NodeId) -> bool {
        let Some(node) = self.repo.remove_node(id) else {
            return false;
        };
        if node.kind == NodeKind::File {
            if let Err(err) = self.blobs.remove(id) {
                warn!(node = %id, error = %err, "blob release failed; payload leaked");
            }
        }
        self.registry.unregister(id);
        if self.session.selected_node_id == Some(id) {
            self.session.selected_node_id = None;
        }
        if self.session.last_selected_node_id == Some(id) {
            self.session.last_selected_node_id = None;
        }
        if self.session.expanded_node_id == Some(id) {
            self.session.expanded_node_id = None;
        }
        true
    }

    /// Mark a node as selected and most recently interacted.
    pub fn select_node(&mut self, id: NodeId) {
        if self.repo.node(id).is_some() {
            self.session.selected_node_id = Some(id);
            self.session.last_selected_node_id = Some(id);
        }
    }

    /// Enter full-screen focus on a node. Leaves pan mode; the two are
    /// mutually exclusive.
    pub fn expand_node(&mut self, id: NodeId) -> bool {
        if self.repo.node(id).is_none() {
            return false;
        }
        self.session.expanded_node_id = Some(id);
        self.session.pan_mode = false;
        true
    }

    /// Leave full-screen focus.
    pub fn collapse_node(&mut self) {
        self.session.expanded_node_id = None;
    }

    /// Toggle pan mode. Turning it on collapses any expanded node.
    pub fn set_pan_mode(&mut self, on: bool) {
        self.session.pan_mode = on;
        if on {
            self.session.expanded_node_id = None;
        }
    }

    /// Node ids bottom-to-top for drawing: collection order with the most
    /// recently interacted node raised to the top.
    #[must_use]
    pub fn stacking_order(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.repo.nodes().iter().map(|n| n.id).collect();
        if let Some(last) = self.session.last_selected_node_id
            && let Some(pos) = ids.iter().position(|id| *id == last)
        {
            let id = ids.remove(pos);
            ids.push(id);
        }
        ids
    }

    /// Random placement inside the visible viewport with the configured
    /// margin per edge. Degrades to centering when the node cannot fit
    /// inside the margins.
    fn place(&self, width: f64, height: f64) -> Point {
        let rect = self
            .camera()
            .visible_rect(self.viewport_width, self.viewport_height);
        let margin_x = rect.width * PLACEMENT_MARGIN_RATIO;
        let margin_y = rect.height * PLACEMENT_MARGIN_RATIO;
        let lo_x = rect.x + margin_x;
        let hi_x = rect.x + rect.width - margin_x - width;
        let lo_y = rect.y + margin_y;
        let hi_y = rect.y + rect.height - margin_y - height;
        let mut rng = rand::rng();
        let x = if hi_x > lo_x {
            rng.random_range(lo_x..hi_x)
        } else {
            rect.x + (rect.width - width) / 2.0
        };
        let y = if hi_y > lo_y {
            rng.random_range(lo_y..hi_y)
        } else {
            rect.y + (rect.height - height) / 2.0
        };
        Point::new(x, y)
    }

    // --- Document registry ---

    /// Register a node's live document as its editor mounts.
    pub fn register_document(&mut self, id: NodeId, doc: Document) {
        self.registry.register(id, doc);
    }

    /// Drop a node's document handle as its editor unmounts.
    pub fn unregister_document(&mut self, id: NodeId) {
        self.registry.unregister(id);
    }

    /// Re-serialize a node's registered document into both persisted
    /// forms, keeping `text` and `structured` consistent.
    pub fn sync_node_document(&mut self, id: NodeId) -> bool {
        let Some(doc) = self.registry.get(id) else {
            return false;
        };
        let fields = PartialNode {
            text: Some(doc.to_html()),
            structured: Some(doc.clone()),
            ..PartialNode::default()
        };
        self.repo.update_node(id, &fields)
    }

    // --- Code operations ---

    /// Create a code. Refused (None) when the name is blank after
    /// trimming; nothing is created and no error is raised.
    pub fn add_code(&mut self, name: &str, color: &str) -> Option<Code> {
        let code = Code::new(name, color)?;
        self.repo.insert_code(code.clone());
        Some(code)
    }

    pub fn update_code(&mut self, id: CodeId, partial: &PartialCode) -> bool {
        self.repo.update_code(id, partial)
    }

    /// Delete a code, stripping its theme marks from every registered
    /// node document first. Documents without a registered handle are
    /// unreachable and keep stale marks (see [`crate::marks`]).
    pub fn delete_code(&mut self, id: CodeId) -> bool {
        if self.repo.code(id).is_none() {
            return false;
        }
        let touched = self.registry.strip_code(id);
        for node_id in touched {
            self.sync_node_document(node_id);
        }
        self.repo.remove_code(id).is_some()
    }

    /// Create a code group. Refused (None) on a blank name.
    pub fn add_code_group(&mut self, name: &str) -> Option<CodeGroup> {
        let group = CodeGroup::new(name)?;
        self.repo.insert_code_group(group.clone());
        Some(group)
    }

    /// Rename a group. Refused on a blank name.
    pub fn rename_code_group(&mut self, id: GroupId, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.repo.update_code_group(id, name)
    }

    /// Delete a group under the chosen member policy: `Move` ungroups the
    /// member codes, `Delete` cascade-deletes them (with mark cleanup).
    pub fn delete_code_group(&mut self, id: GroupId, policy: GroupDeletePolicy) -> bool {
        if !self.repo.code_groups().iter().any(|g| g.id == id) {
            return false;
        }
        let members: Vec<CodeId> = self
            .repo
            .codes()
            .iter()
            .filter(|c| c.group_id == Some(id))
            .map(|c| c.id)
            .collect();
        match policy {
            GroupDeletePolicy::Move => {
                let ungroup = PartialCode { group_id: Some(None), ..PartialCode::default() };
                for member in members {
                    self.repo.update_code(member, &ungroup);
                }
            }
            GroupDeletePolicy::Delete => {
                for member in members {
                    self.delete_code(member);
                }
            }
        }
        self.repo.remove_code_group(id).is_some()
    }

    // --- Annotation ---

    /// Every coded span for a code across all registered documents.
    #[must_use]
    pub fn code_selections(&self, code_id: CodeId) -> Vec<CodeSelection> {
        self.registry.selections_for_code(code_id)
    }

    /// Code a span of a node's document, keeping the node's persisted
    /// forms in sync. Additive on already-coded text.
    pub fn apply_code_selection(
        &mut self,
        node_id: NodeId,
        from: usize,
        to: usize,
        code_id: CodeId,
    ) -> bool {
        let Some(code) = self.repo.code(code_id) else {
            return false;
        };
        if self
            .registry
            .apply_selection(node_id, from, to, code_id, &code.color)
        {
            self.sync_node_document(node_id);
            true
        } else {
            false
        }
    }

    // --- Codebook exchange ---

    /// Serialize the codebook in the given format.
    #[must_use]
    pub fn export_codebook(&self, format: CodebookFormat) -> String {
        let book = Codebook {
            codes: self.repo.codes(),
            groups: self.repo.code_groups(),
        };
        exchange::export(&book, format)
    }

    /// Replace the codebook from serialized form. Atomic: a malformed
    /// payload leaves the existing codes and groups untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError`] when the payload does not match the
    /// expected schema.
    pub fn import_codebook(
        &mut self,
        data: &str,
        format: CodebookFormat,
    ) -> Result<(), ExchangeError> {
        let book = exchange::import(data, format)?;
        self.repo.replace_codebook(book.codes, book.groups);
        Ok(())
    }

    // --- Input events ---

    /// Pointer-down, with the node under the pointer (if any) resolved by
    /// the host's hit-testing.
    pub fn on_pointer_down(&mut self, screen: Point, target: Option<NodeId>) -> Vec<Action> {
        if self.gesture.pointer_active() {
            return Vec::new();
        }
        if self.session.pan_mode {
            self.gesture = Gesture::Panning { last_screen: screen };
            return Vec::new();
        }
        match target {
            Some(id) => {
                let Some(node) = self.repo.node(id) else {
                    return Vec::new();
                };
                if self.drag_claimed_by_other(id) {
                    // Another client already holds this node; refuse.
                    return Vec::new();
                }
                self.gesture = Gesture::DraggingNode {
                    id,
                    start_screen: screen,
                    origin: Point::new(node.x, node.y),
                };
                self.session.selected_node_id = Some(id);
                self.session.last_selected_node_id = Some(id);
                self.repo.publish_drag(Some(id));
                vec![Action::RenderNeeded]
            }
            None => {
                self.session.selected_node_id = None;
                Vec::new()
            }
        }
    }

    /// Pointer-move: pans the canvas or drags the held node, and
    /// refreshes the broadcast cursor position.
    pub fn on_pointer_move(&mut self, screen: Point) -> Vec<Action> {
        let cursor = self.camera().screen_to_canvas(screen);
        self.repo.publish_cursor(Some(cursor));
        match self.gesture {
            Gesture::Panning { last_screen } => {
                let cam = self
                    .camera()
                    .pan_by(screen.x - last_screen.x, screen.y - last_screen.y);
                self.repo.set_camera(cam);
                self.gesture = Gesture::Panning { last_screen: screen };
                vec![Action::RenderNeeded]
            }
            Gesture::DraggingNode { id, start_screen, origin } => {
                // Scale-compensated so drag feel is independent of zoom.
                let scale = self.camera().scale;
                let fields = PartialNode::at(
                    origin.x + (screen.x - start_screen.x) / scale,
                    origin.y + (screen.y - start_screen.y) / scale,
                );
                // Updates flow continuously, not only on release, so other
                // clients see live movement.
                if self.repo.update_node(id, &fields) {
                    vec![Action::NodeUpdated { id, fields }, Action::RenderNeeded]
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }

    /// Pointer-up always returns to idle, releases the drag claim, and
    /// clears the drag designation. The most-recently-interacted marker
    /// survives for z-ordering.
    pub fn on_pointer_up(&mut self) -> Vec<Action> {
        let was_active = self.gesture.pointer_active();
        if self.gesture.is_dragging() {
            self.repo.publish_drag(None);
        }
        self.gesture = Gesture::Idle;
        self.session.selected_node_id = None;
        if was_active {
            vec![Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    /// Wheel input. Ctrl/meta zooms about the pointer; unmodified wheel
    /// pans on both axes. Ignored in pan mode, while a node is expanded,
    /// and during pointer gestures.
    pub fn on_wheel(
        &mut self,
        screen: Point,
        delta: WheelDelta,
        modifiers: Modifiers,
        now_ms: f64,
    ) -> Vec<Action> {
        if self.session.pan_mode || self.session.expanded_node_id.is_some() {
            return Vec::new();
        }
        if self.gesture.pointer_active() {
            return Vec::new();
        }
        let cam = if modifiers.is_pinch() {
            self.camera()
                .zoom_by((-delta.dy * WHEEL_ZOOM_RATE).exp(), Some(screen))
        } else {
            self.camera().pan_by(-delta.dx, -delta.dy)
        };
        self.repo.set_camera(cam);
        self.gesture = Gesture::Scrolling { last_wheel_ms: now_ms };
        vec![Action::RenderNeeded]
    }

    /// Host-driven clock tick; clears the scrolling flag after the
    /// quiescence delay.
    pub fn on_tick(&mut self, now_ms: f64) -> Vec<Action> {
        if self.gesture.settle_scroll(now_ms) {
            vec![Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    /// Touch-start mirrors pointer-down for a single touch; multi-touch
    /// is ignored.
    pub fn on_touch_start(
        &mut self,
        screen: Point,
        target: Option<NodeId>,
        touch_count: usize,
    ) -> Vec<Action> {
        if touch_count != 1 {
            return Vec::new();
        }
        self.on_pointer_down(screen, target)
    }

    /// Touch-move mirrors pointer-move for a single touch.
    pub fn on_touch_move(&mut self, screen: Point, touch_count: usize) -> Vec<Action> {
        if touch_count != 1 {
            return Vec::new();
        }
        self.on_pointer_move(screen)
    }

    /// Touch-end mirrors pointer-up.
    pub fn on_touch_end(&mut self) -> Vec<Action> {
        self.on_pointer_up()
    }

    /// Whether another client's presence already claims this node.
    /// Best-effort read-check-then-write; not a distributed lock.
    fn drag_claimed_by_other(&self, id: NodeId) -> bool {
        self.repo
            .presence_others()
            .iter()
            .any(|p| p.node_being_dragged == Some(id))
    }
}
