// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::audit::AuditLog;
use crate::auth::TokenVerifier;
use crate::files::FileService;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
    pub files: Arc<FileService>,
    /// Held separately from `files` for the readiness probe.
    pub audit: Arc<dyn AuditLog>,
}

impl AppState {
    pub fn new(verifier: TokenVerifier, files: FileService, audit: Arc<dyn AuditLog>) -> Self {
        Self {
            verifier: Arc::new(verifier),
            files: Arc::new(files),
            audit,
        }
    }
}
