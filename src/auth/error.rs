// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
///
/// Every variant maps to `401 Unauthorized`. The display text is safe to
/// return to clients: it never contains key material or upstream detail.
#[derive(Debug)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Authorization header is not exactly `Bearer <token>`
    InvalidAuthHeader,
    /// Token is malformed
    MalformedToken,
    /// Token header carries no `kid`
    MissingKeyId,
    /// Token signature is invalid
    InvalidSignature,
    /// Token has expired
    TokenExpired,
    /// Token issuer is invalid
    InvalidIssuer,
    /// Token audience is invalid
    InvalidAudience,
    /// Token is not yet valid
    TokenNotYetValid,
    /// Token verified but its claims carry no usable subject
    InvalidClaims,
    /// No matching key in the key set
    NoMatchingKey,
    /// The key set could not be fetched or a key could not be decoded.
    /// The payload is for logs only.
    KeyResolution(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::MissingKeyId => "missing_key_id",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::InvalidClaims => "invalid_token_payload",
            AuthError::NoMatchingKey => "no_matching_key",
            AuthError::KeyResolution(_) => "key_resolution_failed",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "No token provided"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::MalformedToken => write!(f, "Token is malformed"),
            AuthError::MissingKeyId => write!(f, "Token header has no key identifier"),
            AuthError::InvalidSignature => write!(f, "Token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::InvalidIssuer => write!(f, "Token issuer is invalid"),
            AuthError::InvalidAudience => write!(f, "Token audience is invalid"),
            AuthError::TokenNotYetValid => write!(f, "Token is not yet valid"),
            AuthError::InvalidClaims => write!(f, "Invalid token payload"),
            AuthError::NoMatchingKey => write!(f, "No matching signing key found"),
            AuthError::KeyResolution(_) => write!(f, "Unable to resolve signing key"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::KeyResolution(ref detail) = self {
            tracing::warn!(detail = %detail, "Signing key resolution failed");
        }
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: format!("Token validation failed: {self}"),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
