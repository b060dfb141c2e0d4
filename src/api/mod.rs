// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::HeaderName,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::AuthenticatedUser,
    error::ErrorBody,
    models::{
        AudioContentType, FileMetadataResponse, PlaybackUrlResponse, UploadUrlRequest,
        UploadUrlResponse,
    },
    state::AppState,
    validation::FieldError,
};

pub mod files;
pub mod health;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/files/upload-url", post(files::create_upload_url))
        .route("/files/playback-url/{file_key}", get(files::create_playback_url))
        .route("/files/{file_key}/metadata", get(files::get_file_metadata))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        files::create_upload_url,
        files::create_playback_url,
        files::get_file_metadata,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            UploadUrlRequest,
            UploadUrlResponse,
            PlaybackUrlResponse,
            FileMetadataResponse,
            AudioContentType,
            AuthenticatedUser,
            ErrorBody,
            FieldError,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Files", description = "Presigned upload and playback URLs"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
