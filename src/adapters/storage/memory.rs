//! In-memory storage backend for tests.

use crate::infra::error::StubResult;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemStorageItem {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Map-backed storage, useful anywhere a real object store would be
/// overkill.
#[derive(Debug, Default)]
pub struct MemStorage {
    objects: Mutex<HashMap<String, MemStorageItem>>,
}

impl MemStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(&self, key: &str) -> bool {
        self.objects
            .lock()
            .expect("storage mutex poisoned")
            .contains_key(key)
    }

    pub fn put(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> StubResult<()> {
        self.objects.lock().expect("storage mutex poisoned").insert(
            key.to_string(),
            MemStorageItem {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(())
    }

    /// Stored object for `key`, if any.
    pub fn get(&self, key: &str) -> Option<MemStorageItem> {
        self.objects
            .lock()
            .expect("storage mutex poisoned")
            .get(key)
            .cloned()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.lock().expect("storage mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
