//! Code and code-group models.
//!
//! A code is a user-defined tag with a name and color, applicable to text
//! spans inside node documents. Codes can be organized into named groups;
//! the group reference is weak and is cleared (never left dangling) when
//! the group is removed.

#[cfg(test)]
#[path = "code_test.rs"]
mod code_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a code.
pub type CodeId = Uuid;

/// Unique identifier for a code group.
pub type GroupId = Uuid;

/// A user-defined tag applicable to text spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Code {
    /// Unique identifier, immutable after creation.
    pub id: CodeId,
    /// Display name; non-empty after trimming.
    pub name: String,
    /// Color (hex), from the default palette or custom. Need not be unique.
    pub color: String,
    /// Optional free-text comment.
    pub comment: Option<String>,
    /// Group membership; `None` means ungrouped.
    pub group_id: Option<GroupId>,
    /// Explicit intra-group sort key. Codes without one sort by their
    /// position in the collection.
    pub order: Option<f64>,
}

impl Code {
    /// Create a code with a trimmed name. Returns `None` when the name is
    /// empty after trimming — the operation is refused, nothing is created.
    #[must_use]
    pub fn new(name: &str, color: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            color: color.to_owned(),
            comment: None,
            group_id: None,
            order: None,
        })
    }
}

/// A named bucket of codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeGroup {
    /// Unique identifier, immutable after creation.
    pub id: GroupId,
    /// Display name; non-empty after trimming.
    pub name: String,
}

impl CodeGroup {
    /// Create a group with a trimmed name; refused when empty.
    #[must_use]
    pub fn new(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self { id: Uuid::new_v4(), name: name.to_owned() })
    }
}

/// What to do with a deleted group's member codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupDeletePolicy {
    /// Clear the members' group reference; the codes survive ungrouped.
    Move,
    /// Cascade-delete the members, including their theme-mark cleanup.
    Delete,
}

/// Sparse update for a code. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialCode {
    /// New name, if being updated. Blank names are ignored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New color, if being updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// New comment, if being updated. An empty string clears it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// New group assignment: `Some(None)` moves the code to ungrouped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<Option<GroupId>>,
    /// New intra-group sort key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
}

impl PartialCode {
    /// Apply this update to a code in place.
    pub fn apply_to(&self, code: &mut Code) {
        if let Some(name) = &self.name {
            let trimmed = name.trim();
            if !trimmed.is_empty() {
                code.name = trimmed.to_owned();
            }
        }
        if let Some(color) = &self.color {
            code.color = color.clone();
        }
        if let Some(comment) = &self.comment {
            code.comment = if comment.is_empty() { None } else { Some(comment.clone()) };
        }
        if let Some(group_id) = self.group_id {
            code.group_id = group_id;
        }
        if let Some(order) = self.order {
            code.order = Some(order);
        }
    }
}

/// Codes belonging to `group` (or ungrouped when `None`), in stable order:
/// the explicit `order` key when present, collection position otherwise.
#[must_use]
pub fn codes_in_group(codes: &[Code], group: Option<GroupId>) -> Vec<Code> {
    let mut members: Vec<(f64, &Code)> = codes
        .iter()
        .enumerate()
        .filter(|(_, c)| c.group_id == group)
        .map(|(i, c)| {
            #[allow(clippy::cast_precision_loss)]
            let key = c.order.unwrap_or(i as f64);
            (key, c)
        })
        .collect();
    members.sort_by(|a, b| a.0.total_cmp(&b.0));
    members.into_iter().map(|(_, c)| c.clone()).collect()
}
