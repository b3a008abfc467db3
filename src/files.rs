//! File decode and blob storage collaborator traits.
//!
//! Decoding (image → data URI, plain text → paragraph-wrapped HTML,
//! docx/markdown → HTML) and durable blob storage are external services.
//! The engine only needs the trait surface: hosts run decodes off the
//! event loop and report back through
//! [`crate::engine::Engine::resolve_file_content`]; blob release happens
//! fire-and-forget on node deletion, with failures logged rather than
//! surfaced.

#[cfg(test)]
#[path = "files_test.rs"]
mod files_test;

use std::collections::HashMap;

use crate::node::{FileKind, NodeId};
use crate::rich::escape_html;

/// Error from a file decode attempt.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The file's format is not one this decoder handles.
    #[error("unsupported file format: {0}")]
    Unsupported(String),
    /// The payload could not be read as its claimed format.
    #[error("corrupt file payload: {0}")]
    Corrupt(String),
}

/// Error from the blob store backend.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("blob store backend failure: {0}")]
    Backend(String),
}

/// Turns a raw file payload into node content.
pub trait FileDecoder {
    /// Decode `bytes` into a content string: a data URI for images, HTML
    /// for everything else.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the payload cannot be decoded; the
    /// caller keeps the node with empty content either way.
    fn decode(&self, name: &str, kind: FileKind, bytes: &[u8]) -> Result<String, DecodeError>;
}

/// Out-of-band storage for file payloads, keyed by node id.
pub trait BlobStore {
    /// Store a payload under a node id.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError`] when the backend rejects the write.
    fn put(&mut self, id: NodeId, content: &str) -> Result<(), BlobError>;

    /// Release the payload stored under a node id, if any.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError`] when the backend rejects the delete. Callers
    /// log and continue; a leaked blob is acceptable, a broken session is
    /// not.
    fn remove(&mut self, id: NodeId) -> Result<(), BlobError>;
}

/// Decoder for plain-text payloads: paragraph-wrapped, entity-escaped
/// HTML. Other kinds are left to richer host-side decoders.
#[derive(Debug, Default)]
pub struct PlainTextDecoder;

impl FileDecoder for PlainTextDecoder {
    fn decode(&self, name: &str, kind: FileKind, bytes: &[u8]) -> Result<String, DecodeError> {
        if kind != FileKind::Text {
            return Err(DecodeError::Unsupported(format!("{name}: not a text file")));
        }
        match std::str::from_utf8(bytes) {
            Ok(text) => Ok(text
                .split('\n')
                .map(|line| format!("<p>{}</p>", escape_html(line)))
                .collect()),
            Err(err) => Err(DecodeError::Corrupt(format!("{name}: {err}"))),
        }
    }
}

/// In-memory blob store.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: HashMap<NodeId, String>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&str> {
        self.blobs.get(&id).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&mut self, id: NodeId, content: &str) -> Result<(), BlobError> {
        self.blobs.insert(id, content.to_owned());
        Ok(())
    }

    fn remove(&mut self, id: NodeId) -> Result<(), BlobError> {
        self.blobs.remove(&id);
        Ok(())
    }
}

/// Blob store that stores nothing; the default for hosts that keep file
/// content inline on the node.
#[derive(Debug, Default)]
pub struct NullBlobStore;

impl BlobStore for NullBlobStore {
    fn put(&mut self, _id: NodeId, _content: &str) -> Result<(), BlobError> {
        Ok(())
    }

    fn remove(&mut self, _id: NodeId) -> Result<(), BlobError> {
        Ok(())
    }
}
