//! Ephemeral per-client presence records for multiplayer rooms.
//!
//! Presence travels on a channel separate from durable room state: last
//! value per client wins, nothing is persisted or merged, and a client's
//! entry evaporates when it disconnects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::Point;
use crate::node::NodeId;

/// Identifier for one connected client in a room.
pub type ClientId = Uuid;

/// Presence information for one connected client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presence {
    /// Connection identifier; unique per client per session.
    pub client_id: ClientId,
    /// Display name shown beside the remote cursor.
    pub name: String,
    /// Assigned presence color (hex).
    pub color: String,
    /// Last known cursor position in canvas coordinates, if any.
    pub cursor: Option<Point>,
    /// Id of the node this client is currently dragging, if any. Read by
    /// the optimistic drag-ownership check before a local drag starts.
    pub node_being_dragged: Option<NodeId>,
}

impl Presence {
    #[must_use]
    pub fn new(client_id: ClientId, name: &str, color: &str) -> Self {
        Self {
            client_id,
            name: name.to_owned(),
            color: color.to_owned(),
            cursor: None,
            node_being_dragged: None,
        }
    }
}
