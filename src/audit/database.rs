// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit store backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `audit_records`: sequence (u64) → serialized AuditRecord
//! - `audit_file_index`: composite key (file_key|sequence_be) → action
//!
//! The sequence is allocated inside the write transaction, so it is strictly
//! increasing in commit order and a forward range scan over one file key's
//! prefix yields its records oldest first.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::{AuditAction, AuditLog, AuditRecord, AuditResult};

/// Primary table: sequence → serialized AuditRecord (JSON bytes).
const AUDIT_RECORDS: TableDefinition<u64, &[u8]> = TableDefinition::new("audit_records");

/// Index: `file_key | sequence_be` → action name.
const AUDIT_FILE_INDEX: TableDefinition<&[u8], &str> = TableDefinition::new("audit_file_index");

const SEQUENCE_LEN: usize = 8;

/// Build the composite index key for one record.
fn make_index_key(file_key: &str, sequence: u64) -> Vec<u8> {
    let mut key = make_prefix(file_key);
    key.extend_from_slice(&sequence.to_be_bytes());
    key
}

/// Prefix shared by every index key of `file_key`.
fn make_prefix(file_key: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(file_key.len() + 1 + SEQUENCE_LEN);
    prefix.extend_from_slice(file_key.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Exclusive upper bound for a range scan over `file_key`'s prefix.
fn make_prefix_end(file_key: &str) -> Vec<u8> {
    let mut end = make_prefix(file_key);
    end.extend_from_slice(&[0xFF; SEQUENCE_LEN + 1]);
    end
}

/// Sequence numbers of `file_key`'s index entries, oldest first, optionally
/// filtered by action.
fn scan_sequences(
    db: &Database,
    file_key: &str,
    action: Option<AuditAction>,
) -> AuditResult<Vec<u64>> {
    let read_txn = db.begin_read()?;
    let index = read_txn.open_table(AUDIT_FILE_INDEX)?;

    let prefix = make_prefix(file_key);
    let prefix_end = make_prefix_end(file_key);

    let mut sequences = Vec::new();
    for entry in index.range(prefix.as_slice()..prefix_end.as_slice())? {
        let (key, value) = entry?;
        let key = key.value();
        // Keys of a different file key can share the prefix bytes.
        if key.len() != prefix.len() + SEQUENCE_LEN {
            continue;
        }
        if let Some(action) = action {
            if value.value() != action.as_str() {
                continue;
            }
        }
        let mut seq = [0u8; SEQUENCE_LEN];
        seq.copy_from_slice(&key[prefix.len()..]);
        sequences.push(u64::from_be_bytes(seq));
    }

    Ok(sequences)
}

fn load_record(db: &Database, sequence: u64) -> AuditResult<Option<AuditRecord>> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(AUDIT_RECORDS)?;
    match table.get(sequence)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}

/// Embedded append-only audit log.
#[derive(Clone)]
pub struct RedbAuditLog {
    db: Arc<Database>,
}

impl RedbAuditLog {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> AuditResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(AUDIT_RECORDS)?;
            let _ = write_txn.open_table(AUDIT_FILE_INDEX)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "Audit database opened");

        Ok(Self { db: Arc::new(db) })
    }

    fn append(db: &Database, entry: &AuditRecord) -> AuditResult<u64> {
        let json = serde_json::to_vec(entry)?;

        let write_txn = db.begin_write()?;
        let sequence = {
            let mut records = write_txn.open_table(AUDIT_RECORDS)?;
            let sequence = match records.last()? {
                Some((last, _)) => last.value() + 1,
                None => 1,
            };
            records.insert(sequence, json.as_slice())?;

            let mut index = write_txn.open_table(AUDIT_FILE_INDEX)?;
            let key = make_index_key(&entry.file_key, sequence);
            index.insert(key.as_slice(), entry.action.as_str())?;
            sequence
        };
        write_txn.commit()?;

        Ok(sequence)
    }
}

#[async_trait]
impl AuditLog for RedbAuditLog {
    async fn record(&self, entry: AuditRecord) -> AuditResult<()> {
        let db = self.db.clone();
        let (sequence, entry) = tokio::task::spawn_blocking(move || {
            Self::append(&db, &entry).map(|seq| (seq, entry))
        })
        .await??;

        tracing::info!(
            sequence,
            action = %entry.action,
            file_key = %entry.file_key,
            user_id = %entry.user_id,
            "Audit record written"
        );
        Ok(())
    }

    async fn find_earliest_upload_record(
        &self,
        file_key: &str,
    ) -> AuditResult<Option<AuditRecord>> {
        let db = self.db.clone();
        let file_key = file_key.to_string();
        tokio::task::spawn_blocking(move || -> AuditResult<Option<AuditRecord>> {
            for sequence in scan_sequences(&db, &file_key, Some(AuditAction::UploadUrlRequested))? {
                if let Some(record) = load_record(&db, sequence)? {
                    if record.file_key == file_key {
                        return Ok(Some(record));
                    }
                }
            }
            Ok(None)
        })
        .await?
    }

    async fn records_for_file(&self, file_key: &str) -> AuditResult<Vec<AuditRecord>> {
        let db = self.db.clone();
        let file_key = file_key.to_string();
        tokio::task::spawn_blocking(move || -> AuditResult<Vec<AuditRecord>> {
            let mut records = Vec::new();
            for sequence in scan_sequences(&db, &file_key, None)? {
                if let Some(record) = load_record(&db, sequence)? {
                    if record.file_key == file_key {
                        records.push(record);
                    }
                }
            }
            Ok(records)
        })
        .await?
    }

    async fn ping(&self) -> AuditResult<()> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || -> AuditResult<()> {
            let read_txn = db.begin_read()?;
            let _ = read_txn.open_table(AUDIT_RECORDS)?;
            Ok(())
        })
        .await?
    }
}
