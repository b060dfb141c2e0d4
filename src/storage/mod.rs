// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Object Storage Gateway
//!
//! Presigned URL issuance and metadata lookups against an S3-compatible
//! object store. Audio bytes never pass through this service: clients PUT
//! and GET directly against the presigned URLs.
//!
//! TTL bounds are the caller's responsibility.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod s3;

#[cfg(test)]
pub(crate) mod memory;

pub use s3::S3Storage;

/// Storage operation errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("presigning failed: {0}")]
    Presign(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Metadata of a stored object, as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub size: u64,
    pub content_type: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Object store operations needed by the file API.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Presigned URL allowing one PUT of `file_key` with `content_type`.
    /// The object need not exist yet.
    async fn create_upload_url(
        &self,
        file_key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> StorageResult<String>;

    /// Presigned URL allowing one GET of `file_key`.
    async fn create_playback_url(&self, file_key: &str, ttl: Duration) -> StorageResult<String>;

    /// Object metadata, `None` when the object does not exist.
    ///
    /// Failures other than "not found" are returned as errors.
    async fn get_metadata(&self, file_key: &str) -> StorageResult<Option<ObjectMetadata>>;
}
