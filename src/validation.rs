// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Input validation for the file API.
//!
//! Each function returns the validated value or every field error found.

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{AudioContentType, PlaybackUrlQuery, UploadUrlRequest};

pub const MIN_DURATION_SECONDS: i64 = 1;
pub const MAX_DURATION_SECONDS: i64 = 7200;

pub const MIN_EXPIRES_HOURS: i64 = 1;
pub const MAX_EXPIRES_HOURS: i64 = 168;
pub const DEFAULT_EXPIRES_HOURS: u32 = 24;

/// One rejected field.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Non-empty list of field errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        Self(vec![FieldError {
            field: field.to_string(),
            message: message.into(),
        }])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(|e| e.field.as_str())
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// A checked upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    pub file_name: String,
    pub content_type: AudioContentType,
    pub duration_seconds: u32,
}

const FILE_NAME_CHARSET_MESSAGE: &str =
    "fileName must contain only alphanumeric characters, dots, hyphens, and underscores";

fn is_valid_file_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

pub fn validate_upload_request(
    req: &UploadUrlRequest,
) -> Result<ValidatedUpload, ValidationErrors> {
    let mut errors = Vec::new();

    let file_name = match req.file_name.as_deref() {
        Some(name) if is_valid_file_name(name) => Some(name.to_string()),
        Some(_) => {
            errors.push(FieldError {
                field: "fileName".to_string(),
                message: FILE_NAME_CHARSET_MESSAGE.to_string(),
            });
            None
        }
        None => {
            errors.push(FieldError {
                field: "fileName".to_string(),
                message: "fileName is required".to_string(),
            });
            None
        }
    };

    let content_type = match req.content_type.as_deref().map(AudioContentType::parse) {
        Some(Some(ct)) => Some(ct),
        _ => {
            errors.push(FieldError {
                field: "contentType".to_string(),
                message: "contentType must be one of: audio/m4a, audio/wav, audio/mp4".to_string(),
            });
            None
        }
    };

    let duration_range = MIN_DURATION_SECONDS..=MAX_DURATION_SECONDS;
    let duration_seconds = match req.duration_seconds {
        Some(d) if duration_range.contains(&d) => u32::try_from(d).ok(),
        Some(_) => {
            errors.push(FieldError {
                field: "durationSeconds".to_string(),
                message: format!(
                    "durationSeconds must be between {} and {}",
                    duration_range.start(),
                    duration_range.end()
                ),
            });
            None
        }
        None => {
            errors.push(FieldError {
                field: "durationSeconds".to_string(),
                message: "durationSeconds is required".to_string(),
            });
            None
        }
    };

    match (file_name, content_type, duration_seconds) {
        (Some(file_name), Some(content_type), Some(duration_seconds)) if errors.is_empty() => {
            Ok(ValidatedUpload {
                file_name,
                content_type,
                duration_seconds,
            })
        }
        _ => Err(ValidationErrors(errors)),
    }
}

/// Requested playback lifetime in hours. Absent means the default of 24.
pub fn validate_playback_query(query: &PlaybackUrlQuery) -> Result<u32, ValidationErrors> {
    match query.expires_hours {
        None => Ok(DEFAULT_EXPIRES_HOURS),
        Some(h) if (MIN_EXPIRES_HOURS..=MAX_EXPIRES_HOURS).contains(&h) => u32::try_from(h)
            .map_err(|_| ValidationErrors::single("expiresHours", "expiresHours is out of range")),
        Some(_) => Err(ValidationErrors::single(
            "expiresHours",
            format!("expiresHours must be between {MIN_EXPIRES_HOURS} and {MAX_EXPIRES_HOURS}"),
        )),
    }
}
