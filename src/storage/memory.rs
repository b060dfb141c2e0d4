// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory object store double for handler and service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{ObjectMetadata, ObjectStorage, StorageError, StorageResult};

/// Objects are added with [`MemoryStorage::put_object`]; URLs encode the
/// method, key and TTL so tests can assert on them.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, ObjectMetadata>>,
    failing: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_object(&self, file_key: &str, metadata: ObjectMetadata) {
        self.objects
            .lock()
            .unwrap()
            .insert(file_key.to_string(), metadata);
    }

    /// Make every call fail with a backend error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> StorageResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StorageError::Backend("connection reset by peer".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn create_upload_url(
        &self,
        file_key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> StorageResult<String> {
        self.check()?;
        Ok(format!(
            "https://storage.test/{file_key}?method=PUT&content-type={content_type}&expires={}",
            ttl.as_secs()
        ))
    }

    async fn create_playback_url(&self, file_key: &str, ttl: Duration) -> StorageResult<String> {
        self.check()?;
        Ok(format!(
            "https://storage.test/{file_key}?method=GET&expires={}",
            ttl.as_secs()
        ))
    }

    async fn get_metadata(&self, file_key: &str) -> StorageResult<Option<ObjectMetadata>> {
        self.check()?;
        Ok(self.objects.lock().unwrap().get(file_key).cloned())
    }
}
