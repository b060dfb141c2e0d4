// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the file API. Wire names are camelCase.
//! Request types keep every field optional so that validation can report
//! all missing or invalid fields at once instead of failing on the first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// =============================================================================
// Content Types
// =============================================================================

/// Accepted audio content types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
pub enum AudioContentType {
    #[serde(rename = "audio/m4a")]
    M4a,
    #[serde(rename = "audio/wav")]
    Wav,
    #[serde(rename = "audio/mp4")]
    Mp4,
}

impl AudioContentType {
    pub const ALL: [AudioContentType; 3] = [Self::M4a, Self::Wav, Self::Mp4];

    pub fn as_str(&self) -> &'static str {
        match self {
            AudioContentType::M4a => "audio/m4a",
            AudioContentType::Wav => "audio/wav",
            AudioContentType::Mp4 => "audio/mp4",
        }
    }

    /// Exact, case-sensitive match against the accepted MIME strings.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ct| ct.as_str() == value)
    }
}

impl std::fmt::Display for AudioContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Upload
// =============================================================================

/// Body of `POST /v1/files/upload-url`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    /// Letters, digits, `.`, `_` and `-` only.
    #[schema(example = "interview-01.m4a")]
    pub file_name: Option<String>,
    /// One of `audio/m4a`, `audio/wav`, `audio/mp4`.
    #[schema(example = "audio/m4a")]
    pub content_type: Option<String>,
    /// Declared duration, 1 to 7200 seconds.
    #[schema(example = 180)]
    pub duration_seconds: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    /// Presigned PUT URL.
    pub upload_url: String,
    /// Key identifying the object from now on.
    pub file_key: String,
}

// =============================================================================
// Playback
// =============================================================================

/// Query of `GET /v1/files/playback-url/{fileKey}`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PlaybackUrlQuery {
    /// URL lifetime in hours, 1 to 168. Defaults to 24.
    pub expires_hours: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackUrlResponse {
    /// Presigned GET URL.
    pub playback_url: String,
}

// =============================================================================
// Metadata
// =============================================================================

/// Stored object metadata merged with the declared upload details.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadataResponse {
    pub file_key: String,
    /// Object size in bytes.
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Last-modified time reported by the store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
    /// Duration declared when the upload URL was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    /// File name declared when the upload URL was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_parse_is_exact() {
        assert_eq!(AudioContentType::parse("audio/wav"), Some(AudioContentType::Wav));
        assert_eq!(AudioContentType::parse("audio/mp4"), Some(AudioContentType::Mp4));
        assert_eq!(AudioContentType::parse("AUDIO/WAV"), None);
        assert_eq!(AudioContentType::parse("audio/mpeg"), None);
    }

    #[test]
    fn upload_request_uses_camel_case() {
        let req: UploadUrlRequest = serde_json::from_str(
            r#"{"fileName":"a.wav","contentType":"audio/wav","durationSeconds":12}"#,
        )
        .unwrap();
        assert_eq!(req.file_name.as_deref(), Some("a.wav"));
        assert_eq!(req.content_type.as_deref(), Some("audio/wav"));
        assert_eq!(req.duration_seconds, Some(12));
    }

    #[test]
    fn metadata_response_omits_absent_fields() {
        let body = FileMetadataResponse {
            file_key: "k".to_string(),
            size: 10,
            content_type: None,
            uploaded_at: None,
            duration_seconds: None,
            file_name: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "fileKey": "k", "size": 10 }));
    }
}
