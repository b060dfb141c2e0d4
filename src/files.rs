// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # File Service
//!
//! Orchestrates the object store and the audit log for the three file
//! operations. Inputs arrive already validated; the caller's identity is
//! already verified.

use std::sync::Arc;
use std::time::Duration;

use crate::audit::{AuditAction, AuditError, AuditLog, AuditRecord};
use crate::auth::AuthenticatedUser;
use crate::models::{FileMetadataResponse, PlaybackUrlResponse, UploadUrlResponse};
use crate::storage::{ObjectStorage, StorageError};
use crate::validation::ValidatedUpload;

pub const DEFAULT_UPLOAD_URL_TTL: Duration = Duration::from_secs(900);
pub const DEFAULT_MAX_PLAYBACK_HOURS: u32 = 168;

const SECONDS_PER_HOUR: u64 = 3600;

/// URL lifetime limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileLimits {
    pub upload_url_ttl: Duration,
    /// Requested playback lifetimes above this are clamped, not rejected.
    pub max_playback_hours: u32,
}

impl Default for FileLimits {
    fn default() -> Self {
        Self {
            upload_url_ttl: DEFAULT_UPLOAD_URL_TTL,
            max_playback_hours: DEFAULT_MAX_PLAYBACK_HOURS,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("File with key {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Audit(#[from] AuditError),
}

pub type FileResult<T> = Result<T, FileError>;

pub struct FileService {
    storage: Arc<dyn ObjectStorage>,
    audit: Arc<dyn AuditLog>,
    limits: FileLimits,
}

impl FileService {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        audit: Arc<dyn AuditLog>,
        limits: FileLimits,
    ) -> Self {
        Self {
            storage,
            audit,
            limits,
        }
    }

    /// Mint a fresh file key and a presigned upload URL for it, then record
    /// the upload intent.
    ///
    /// The audit write completes before the URL is returned.
    pub async fn create_upload_url(
        &self,
        user: &AuthenticatedUser,
        upload: ValidatedUpload,
    ) -> FileResult<UploadUrlResponse> {
        let file_key = uuid::Uuid::new_v4().to_string();

        let upload_url = self
            .storage
            .create_upload_url(
                &file_key,
                upload.content_type.as_str(),
                self.limits.upload_url_ttl,
            )
            .await?;

        let record = AuditRecord::new(AuditAction::UploadUrlRequested, &user.user_id, &file_key)
            .with_upload_details(
                upload.file_name,
                upload.content_type.as_str(),
                upload.duration_seconds,
            );
        self.audit.record(record).await?;

        tracing::info!(
            user_id = %user.user_id,
            file_key = %file_key,
            content_type = %upload.content_type,
            "Upload URL issued"
        );

        Ok(UploadUrlResponse { upload_url, file_key })
    }

    /// Presigned playback URL for an existing object.
    ///
    /// `expires_hours` is clamped to the configured maximum. Unknown keys
    /// fail with [`FileError::NotFound`] and leave no audit record.
    pub async fn create_playback_url(
        &self,
        user: &AuthenticatedUser,
        file_key: &str,
        expires_hours: u32,
    ) -> FileResult<PlaybackUrlResponse> {
        let hours = expires_hours.min(self.limits.max_playback_hours);

        if self.storage.get_metadata(file_key).await?.is_none() {
            return Err(FileError::NotFound(file_key.to_string()));
        }

        let ttl = Duration::from_secs(u64::from(hours) * SECONDS_PER_HOUR);
        let playback_url = self.storage.create_playback_url(file_key, ttl).await?;

        self.audit
            .record(
                AuditRecord::new(AuditAction::PlaybackUrlRequested, &user.user_id, file_key)
                    .with_metadata(serde_json::json!({ "expiresHours": hours })),
            )
            .await?;

        tracing::info!(
            user_id = %user.user_id,
            file_key = %file_key,
            requested_hours = expires_hours,
            expires_hours = hours,
            "Playback URL issued"
        );

        Ok(PlaybackUrlResponse { playback_url })
    }

    /// Stored object metadata merged with the first declared upload details.
    pub async fn file_metadata(&self, file_key: &str) -> FileResult<FileMetadataResponse> {
        let object = self
            .storage
            .get_metadata(file_key)
            .await?
            .ok_or_else(|| FileError::NotFound(file_key.to_string()))?;

        let upload = self.audit.find_earliest_upload_record(file_key).await?;
        let (file_name, duration_seconds) = match upload {
            Some(record) => (record.file_name, record.duration_seconds),
            None => (None, None),
        };

        Ok(FileMetadataResponse {
            file_key: file_key.to_string(),
            size: object.size,
            content_type: object.content_type,
            uploaded_at: object.last_modified,
            duration_seconds,
            file_name,
        })
    }
}
