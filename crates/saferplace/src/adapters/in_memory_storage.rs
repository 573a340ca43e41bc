// Rust guideline compliant 2026-10-15

//! In-memory adapter for the `Storage` port.
//!
//! Keeps uploaded blobs in a map keyed by a fresh UUID. Intended for demo
//! runs; nothing survives a restart.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use domain::{Storage, StorageError};

/// `Storage` adapter backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    /// Content type and body, keyed by id.
    blobs: Mutex<HashMap<String, (String, Vec<u8>)>>,
}

impl InMemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type and size of a stored blob.
    #[cfg(test)]
    #[must_use]
    pub fn describe(&self, id: &str) -> Option<(String, usize)> {
        let blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        blobs.get(id).map(|(content_type, body)| (content_type.clone(), body.len()))
    }
}

impl Storage for InMemoryStorage {
    async fn upload(&self, body: Vec<u8>, content_type: &str) -> Result<String, StorageError> {
        let id = uuid::Uuid::new_v4().to_string();
        let mut blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        blobs.insert(id.clone(), (content_type.to_owned(), body));
        drop(blobs);
        tracing::debug!(image_id = %id, "in_memory_storage.uploaded");
        Ok(id)
    }
}
