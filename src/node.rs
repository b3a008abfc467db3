//! Node model: the content items placed on the canvas.
//!
//! A node is either a rich-text note or an imported file. Both carry a
//! position and size in canvas coordinates. `PartialNode` is the sparse
//! update type used for incremental edits; only present fields apply.

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{
    FILE_NODE_DEFAULT_HEIGHT, FILE_NODE_DEFAULT_WIDTH, NODE_MAX_HEIGHT, NODE_MAX_WIDTH,
    NODE_MIN_HEIGHT, NODE_MIN_WIDTH, TEXT_NODE_DEFAULT_HEIGHT, TEXT_NODE_DEFAULT_WIDTH,
};
use crate::rich::Document;

/// Unique identifier for a node.
pub type NodeId = Uuid;

/// The kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Rich-text note.
    Text,
    /// Imported file (image, pdf, or extracted text).
    File,
}

impl NodeKind {
    /// Kind name used as the display-label fallback.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::File => "file",
        }
    }

    /// Default size for freshly created nodes of this kind.
    #[must_use]
    pub fn default_size(self) -> (f64, f64) {
        match self {
            Self::Text => (TEXT_NODE_DEFAULT_WIDTH, TEXT_NODE_DEFAULT_HEIGHT),
            Self::File => (FILE_NODE_DEFAULT_WIDTH, FILE_NODE_DEFAULT_HEIGHT),
        }
    }
}

/// Coarse content category of an imported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Pdf,
    Text,
}

/// A content item placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier, immutable after creation.
    pub id: NodeId,
    /// Text or file.
    pub kind: NodeKind,
    /// Left edge of the node in canvas coordinates.
    pub x: f64,
    /// Top edge of the node in canvas coordinates.
    pub y: f64,
    /// Width in canvas units, within the configured bounds.
    pub width: f64,
    /// Height in canvas units, within the configured bounds.
    pub height: f64,
    /// Optional display name; display falls back to the kind name.
    pub label: Option<String>,
    /// Serialized rich-document content (HTML form) — the canonical
    /// persisted form for text nodes.
    pub text: Option<String>,
    /// Structured document tree mirroring `text`; kept consistent with it
    /// on every edit.
    pub structured: Option<Document>,
    /// Original filename (file nodes).
    pub file_name: Option<String>,
    /// Coarse content category (file nodes).
    pub file_kind: Option<FileKind>,
    /// Decoded content payload: data URI or extracted text. May be stored
    /// out-of-band in a blob store keyed by the node id.
    pub content: Option<String>,
}

impl Node {
    /// Create a text node at the given position with default size and
    /// empty-paragraph content in both representations.
    #[must_use]
    pub fn new_text(x: f64, y: f64) -> Self {
        let (width, height) = NodeKind::Text.default_size();
        let doc = Document::empty_paragraph();
        Self {
            id: Uuid::new_v4(),
            kind: NodeKind::Text,
            x,
            y,
            width,
            height,
            label: None,
            text: Some(doc.to_html()),
            structured: Some(doc),
            file_name: None,
            file_kind: None,
            content: None,
        }
    }

    /// Create a file node at the given position. Content starts empty and
    /// resolves later when the host finishes decoding.
    #[must_use]
    pub fn new_file(x: f64, y: f64, file_name: &str, file_kind: FileKind) -> Self {
        let (width, height) = NodeKind::File.default_size();
        Self {
            id: Uuid::new_v4(),
            kind: NodeKind::File,
            x,
            y,
            width,
            height,
            label: None,
            text: None,
            structured: None,
            file_name: Some(file_name.to_owned()),
            file_kind: Some(file_kind),
            content: None,
        }
    }

    /// Display name: the label when non-empty, the kind name otherwise.
    #[must_use]
    pub fn display_label(&self) -> &str {
        match &self.label {
            Some(label) if !label.trim().is_empty() => label,
            _ => self.kind.as_str(),
        }
    }

    /// Bounding rectangle in canvas coordinates.
    #[must_use]
    pub fn rect(&self) -> crate::camera::Rect {
        crate::camera::Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Sparse update for a node. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialNode {
    /// New x position, if being updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// New y position, if being updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// New width, clamped to the node size bounds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// New height, clamped to the node size bounds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// New label. An empty string clears back to the kind-name fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// New serialized rich-text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// New structured content, mirroring `text`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured: Option<Document>,
    /// New decoded file content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl PartialNode {
    /// A position-only update, as emitted continuously during a drag.
    #[must_use]
    pub fn at(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), ..Self::default() }
    }

    /// Apply this update to a node in place. Sizes clamp to the bounds.
    pub fn apply_to(&self, node: &mut Node) {
        if let Some(x) = self.x {
            node.x = x;
        }
        if let Some(y) = self.y {
            node.y = y;
        }
        if let Some(w) = self.width {
            node.width = w.clamp(NODE_MIN_WIDTH, NODE_MAX_WIDTH);
        }
        if let Some(h) = self.height {
            node.height = h.clamp(NODE_MIN_HEIGHT, NODE_MAX_HEIGHT);
        }
        if let Some(label) = &self.label {
            node.label = if label.is_empty() { None } else { Some(label.clone()) };
        }
        if let Some(text) = &self.text {
            node.text = Some(text.clone());
        }
        if let Some(doc) = &self.structured {
            node.structured = Some(doc.clone());
        }
        if let Some(content) = &self.content {
            node.content = Some(content.clone());
        }
    }
}
