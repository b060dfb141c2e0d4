// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Append-only audit trail of file URL issuance.
//!
//! Records are never updated or deleted. Insertion order per file key is
//! preserved so the first upload intent for a key can be found later.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod database;

pub use database::RedbAuditLog;

/// Auditable file actions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    UploadUrlRequested,
    PlaybackUrlRequested,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UploadUrlRequested => "upload_url_requested",
            AuditAction::PlaybackUrlRequested => "playback_url_requested",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique record ID.
    pub record_id: String,
    /// User who triggered the action.
    pub user_id: String,
    /// File the action refers to.
    pub file_key: String,
    pub action: AuditAction,
    /// Declared file name (upload intents only).
    pub file_name: Option<String>,
    /// Declared content type (upload intents only).
    pub content_type: Option<String>,
    /// Declared duration (upload intents only).
    pub duration_seconds: Option<u32>,
    /// Action-specific extras, e.g. `{"expiresHours": 24}`.
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Create a new record stamped with the current time.
    pub fn new(
        action: AuditAction,
        user_id: impl Into<String>,
        file_key: impl Into<String>,
    ) -> Self {
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            file_key: file_key.into(),
            action,
            file_name: None,
            content_type: None,
            duration_seconds: None,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    /// Attach the declared upload details.
    pub fn with_upload_details(
        mut self,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        duration_seconds: u32,
    ) -> Self {
        self.file_name = Some(file_name.into());
        self.content_type = Some(content_type.into());
        self.duration_seconds = Some(duration_seconds);
        self
    }

    /// Add metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("audit database directory error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit record serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("audit worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type AuditResult<T> = Result<T, AuditError>;

/// Persistent, append-only audit store.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append one record.
    async fn record(&self, entry: AuditRecord) -> AuditResult<()>;

    /// The first `upload_url_requested` record ever written for `file_key`.
    async fn find_earliest_upload_record(
        &self,
        file_key: &str,
    ) -> AuditResult<Option<AuditRecord>>;

    /// All records of `file_key`, in insertion order.
    async fn records_for_file(&self, file_key: &str) -> AuditResult<Vec<AuditRecord>>;

    /// Cheap readability check for readiness probes.
    async fn ping(&self) -> AuditResult<()>;
}
