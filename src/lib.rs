// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audio Vault - Presigned Audio Upload & Playback Service
//!
//! This crate issues time-limited presigned object-storage URLs for audio
//! uploads and playback. Every request is authenticated with a JWKS-verified
//! bearer token and every issued URL leaves an append-only audit record.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum) and OpenAPI document
//! - `auth` - Bearer token verification against a remote key set
//! - `storage` - S3 presigning and object metadata
//! - `audit` - Append-only audit log (redb)
//! - `files` - Orchestration of the three file operations

pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod files;
pub mod models;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod validation;
