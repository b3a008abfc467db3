//! Single-user backend: in-process collections with snapshot persistence.
//!
//! Collections and the camera record are loaded from a key-value snapshot
//! store on open and written back whole after every mutation (one key per
//! collection, JSON form). There is a single writer, so mutations apply
//! in call order and last-write-wins trivially.
//!
//! ERROR HANDLING
//! ==============
//! A failed snapshot write is logged and the in-memory state stays
//! authoritative for the rest of the session; a corrupt stored snapshot
//! is logged and replaced by the empty default rather than aborting the
//! session.

#[cfg(test)]
#[path = "local_test.rs"]
mod local_test;

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::camera::{Camera, Point};
use crate::code::{Code, CodeGroup, CodeId, GroupId, PartialCode};
use crate::node::{Node, NodeId, PartialNode};
use crate::presence::{ClientId, Presence};
use crate::repo::CanvasRepository;

const KEY_NODES: &str = "nodes";
const KEY_CODES: &str = "codes";
const KEY_CODE_GROUPS: &str = "codeGroups";
const KEY_VIEWPORT: &str = "viewport";

/// Error from the snapshot store backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("snapshot store backend failure: {0}")]
    Backend(String),
}

/// Durable key-value storage with whole-collection snapshot semantics.
pub trait SnapshotStore {
    /// Read the JSON snapshot stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the snapshot stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend rejects the write.
    fn store(&mut self, key: &str, json: &str) -> Result<(), StorageError>;
}

/// In-memory snapshot store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn store(&mut self, key: &str, json: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_owned(), json.to_owned());
        Ok(())
    }
}

/// The single-user repository.
pub struct LocalRepository {
    nodes: Vec<Node>,
    codes: Vec<Code>,
    code_groups: Vec<CodeGroup>,
    camera: Camera,
    store: Box<dyn SnapshotStore>,
}

impl LocalRepository {
    /// Open a repository over a snapshot store, hydrating collections
    /// from any snapshots already present.
    #[must_use]
    pub fn open(store: Box<dyn SnapshotStore>) -> Self {
        let nodes = load_or_default(store.as_ref(), KEY_NODES);
        let codes = load_or_default(store.as_ref(), KEY_CODES);
        let code_groups = load_or_default(store.as_ref(), KEY_CODE_GROUPS);
        let camera = load_or_default(store.as_ref(), KEY_VIEWPORT);
        Self { nodes, codes, code_groups, camera, store }
    }

    /// A repository with no persistence history, backed by a fresh
    /// in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::open(Box::new(MemoryStore::new()))
    }

    fn persist<T: Serialize>(&mut self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => {
                if let Err(err) = self.store.store(key, &json) {
                    warn!(key, error = %err, "snapshot write failed; keeping in-memory state");
                }
            }
            Err(err) => warn!(key, error = %err, "snapshot serialization failed"),
        }
    }

    fn persist_nodes(&mut self) {
        let nodes = self.nodes.clone();
        self.persist(KEY_NODES, &nodes);
    }

    fn persist_codes(&mut self) {
        let codes = self.codes.clone();
        self.persist(KEY_CODES, &codes);
    }

    fn persist_code_groups(&mut self) {
        let groups = self.code_groups.clone();
        self.persist(KEY_CODE_GROUPS, &groups);
    }
}

fn load_or_default<T: DeserializeOwned + Default>(store: &dyn SnapshotStore, key: &str) -> T {
    match store.load(key) {
        Ok(Some(json)) => match serde_json::from_str(&json) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "corrupt snapshot; starting from default");
                T::default()
            }
        },
        Ok(None) => T::default(),
        Err(err) => {
            warn!(key, error = %err, "snapshot read failed; starting from default");
            T::default()
        }
    }
}

impl CanvasRepository for LocalRepository {
    fn nodes(&self) -> Vec<Node> {
        self.nodes.clone()
    }

    fn node(&self, id: NodeId) -> Option<Node> {
        self.nodes.iter().find(|n| n.id == id).cloned()
    }

    fn insert_node(&mut self, node: Node) {
        self.nodes.push(node);
        self.persist_nodes();
    }

    fn update_node(&mut self, id: NodeId, partial: &PartialNode) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        partial.apply_to(node);
        self.persist_nodes();
        true
    }

    fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let pos = self.nodes.iter().position(|n| n.id == id)?;
        let node = self.nodes.remove(pos);
        self.persist_nodes();
        Some(node)
    }

    fn codes(&self) -> Vec<Code> {
        self.codes.clone()
    }

    fn code(&self, id: CodeId) -> Option<Code> {
        self.codes.iter().find(|c| c.id == id).cloned()
    }

    fn insert_code(&mut self, code: Code) {
        self.codes.push(code);
        self.persist_codes();
    }

    fn update_code(&mut self, id: CodeId, partial: &PartialCode) -> bool {
        let Some(code) = self.codes.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        partial.apply_to(code);
        self.persist_codes();
        true
    }

    fn remove_code(&mut self, id: CodeId) -> Option<Code> {
        let pos = self.codes.iter().position(|c| c.id == id)?;
        let code = self.codes.remove(pos);
        self.persist_codes();
        Some(code)
    }

    fn code_groups(&self) -> Vec<CodeGroup> {
        self.code_groups.clone()
    }

    fn insert_code_group(&mut self, group: CodeGroup) {
        self.code_groups.push(group);
        self.persist_code_groups();
    }

    fn update_code_group(&mut self, id: GroupId, name: &str) -> bool {
        let Some(group) = self.code_groups.iter_mut().find(|g| g.id == id) else {
            return false;
        };
        group.name = name.to_owned();
        self.persist_code_groups();
        true
    }

    fn remove_code_group(&mut self, id: GroupId) -> Option<CodeGroup> {
        let pos = self.code_groups.iter().position(|g| g.id == id)?;
        let group = self.code_groups.remove(pos);
        self.persist_code_groups();
        Some(group)
    }

    fn replace_codebook(&mut self, codes: Vec<Code>, groups: Vec<CodeGroup>) {
        self.codes = codes;
        self.code_groups = groups;
        self.persist_codes();
        self.persist_code_groups();
    }

    fn camera(&self) -> Camera {
        self.camera
    }

    fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
        self.persist(KEY_VIEWPORT, &camera);
    }

    fn client_id(&self) -> Option<ClientId> {
        None
    }

    fn publish_cursor(&mut self, _cursor: Option<Point>) {}

    fn publish_drag(&mut self, _node: Option<NodeId>) {}

    fn presence_others(&self) -> Vec<Presence> {
        Vec::new()
    }
}
