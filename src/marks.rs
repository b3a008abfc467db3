//! Document registry and the derived annotation index.
//!
//! "Which spans are tagged with which code" is never stored as a
//! normalized table; it is recomputed on demand by walking the live
//! rich-text documents. The registry maps node ids to the document
//! handles hosts register as editors mount and drop as they unmount.
//!
//! Documents that are not registered are unreachable: a code deleted
//! while a node's editor is unmounted leaves stale marks in that node's
//! document until it is next registered. This is a known consistency
//! gap in the design, kept rather than papered over with a durable
//! per-node mark index.

#[cfg(test)]
#[path = "marks_test.rs"]
mod marks_test;

use std::collections::HashMap;

use crate::code::CodeId;
use crate::node::NodeId;
use crate::rich::Document;

/// A contiguous coded span in one node's document. Derived, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeSelection {
    pub node_id: NodeId,
    /// Start offset (inclusive) in document positions.
    pub from: usize,
    /// End offset (exclusive) in document positions.
    pub to: usize,
    /// The span's text at query time.
    pub text: String,
    /// All code ids tagging the span (a span may be multiply coded).
    pub theme_ids: Vec<CodeId>,
    /// Colors positionally aligned with `theme_ids`.
    pub colors: Vec<String>,
}

/// Live document handles keyed by node id.
///
/// Hosts register a node's document when its editor mounts and
/// unregister it on unmount; annotation queries and code-deletion
/// cleanup reach exactly the registered set.
#[derive(Debug, Default)]
pub struct DocRegistry {
    docs: HashMap<NodeId, Document>,
}

impl DocRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { docs: HashMap::new() }
    }

    /// Register a node's live document, replacing any previous handle.
    pub fn register(&mut self, node_id: NodeId, doc: Document) {
        self.docs.insert(node_id, doc);
    }

    /// Drop a node's handle, returning the document if it was registered.
    pub fn unregister(&mut self, node_id: NodeId) -> Option<Document> {
        self.docs.remove(&node_id)
    }

    #[must_use]
    pub fn is_registered(&self, node_id: NodeId) -> bool {
        self.docs.contains_key(&node_id)
    }

    #[must_use]
    pub fn get(&self, node_id: NodeId) -> Option<&Document> {
        self.docs.get(&node_id)
    }

    pub fn get_mut(&mut self, node_id: NodeId) -> Option<&mut Document> {
        self.docs.get_mut(&node_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Every span tagged with `code_id` across all registered documents,
    /// sorted by node id then position for a stable result order.
    #[must_use]
    pub fn selections_for_code(&self, code_id: CodeId) -> Vec<CodeSelection> {
        let mut out = Vec::new();
        for (node_id, doc) in &self.docs {
            for span in doc.spans() {
                if let Some(mark) = span.mark
                    && mark.contains(code_id)
                {
                    out.push(CodeSelection {
                        node_id: *node_id,
                        from: span.from,
                        to: span.to,
                        text: span.text.to_owned(),
                        theme_ids: mark.theme_ids.clone(),
                        colors: mark.colors.clone(),
                    });
                }
            }
        }
        out.sort_by(|a, b| a.node_id.cmp(&b.node_id).then(a.from.cmp(&b.from)));
        out
    }

    /// Apply a theme mark over `[from, to)` in one node's document.
    /// Additive for already-coded text. Returns false when the node has
    /// no registered document or the range covers no text.
    pub fn apply_selection(
        &mut self,
        node_id: NodeId,
        from: usize,
        to: usize,
        code_id: CodeId,
        color: &str,
    ) -> bool {
        match self.docs.get_mut(&node_id) {
            Some(doc) => doc.apply_mark(from, to, code_id, color),
            None => false,
        }
    }

    /// Remove `code_id` from every mark in every registered document.
    /// Returns the ids of nodes whose documents changed, so the caller
    /// can re-serialize them.
    pub fn strip_code(&mut self, code_id: CodeId) -> Vec<NodeId> {
        let mut touched = Vec::new();
        for (node_id, doc) in &mut self.docs {
            if doc.strip_code(code_id) {
                touched.push(*node_id);
            }
        }
        touched.sort();
        touched
    }
}
