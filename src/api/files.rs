// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! File endpoints: upload URLs, playback URLs and metadata.
//!
//! Handlers take `Auth` first so unauthenticated requests are rejected
//! before the body or query is looked at.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};

use crate::auth::Auth;
use crate::error::{ApiError, ErrorBody};
use crate::models::{
    FileMetadataResponse, PlaybackUrlQuery, PlaybackUrlResponse, UploadUrlRequest,
    UploadUrlResponse,
};
use crate::state::AppState;
use crate::validation::{validate_playback_query, validate_upload_request};

/// Request a presigned upload URL for a new audio file.
#[utoipa::path(
    post,
    path = "/v1/files/upload-url",
    request_body = UploadUrlRequest,
    tag = "Files",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Upload URL issued", body = UploadUrlResponse),
        (status = 400, description = "Invalid request body", body = ErrorBody),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 502, description = "Object storage unavailable", body = ErrorBody),
    )
)]
pub async fn create_upload_url(
    Auth(user): Auth,
    State(state): State<AppState>,
    body: Result<Json<UploadUrlRequest>, JsonRejection>,
) -> Result<Json<UploadUrlResponse>, ApiError> {
    let Json(request) = body?;
    let upload = validate_upload_request(&request)?;
    let response = state.files.create_upload_url(&user, upload).await?;
    Ok(Json(response))
}

/// Request a presigned playback URL for an uploaded file.
#[utoipa::path(
    get,
    path = "/v1/files/playback-url/{fileKey}",
    params(
        ("fileKey" = String, Path, description = "Key returned when the upload URL was issued"),
        PlaybackUrlQuery
    ),
    tag = "Files",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Playback URL issued", body = PlaybackUrlResponse),
        (status = 400, description = "expiresHours out of range", body = ErrorBody),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "File not found", body = ErrorBody),
    )
)]
pub async fn create_playback_url(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(file_key): Path<String>,
    query: Result<Query<PlaybackUrlQuery>, QueryRejection>,
) -> Result<Json<PlaybackUrlResponse>, ApiError> {
    let Query(query) = query?;
    let hours = validate_playback_query(&query)?;
    let response = state.files.create_playback_url(&user, &file_key, hours).await?;
    Ok(Json(response))
}

/// Get stored metadata of an uploaded file.
#[utoipa::path(
    get,
    path = "/v1/files/{fileKey}/metadata",
    params(
        ("fileKey" = String, Path, description = "Key returned when the upload URL was issued")
    ),
    tag = "Files",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "File metadata", body = FileMetadataResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "File not found", body = ErrorBody),
    )
)]
pub async fn get_file_metadata(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(file_key): Path<String>,
) -> Result<Json<FileMetadataResponse>, ApiError> {
    tracing::debug!(user_id = %user.user_id, file_key = %file_key, "File metadata requested");
    let response = state.files.file_metadata(&file_key).await?;
    Ok(Json(response))
}
