// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims read from a verified bearer token.
///
/// `exp`, `iss` and `aud` are checked by `jsonwebtoken` during decoding and
/// are therefore not kept here.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Email address (custom claim, optional)
    #[serde(default)]
    pub email: Option<String>,

    /// Role names (custom claim, defaults to empty)
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Authenticated identity extracted from a verified JWT.
///
/// One per request; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Canonical user ID (`sub` claim)
    pub user_id: String,

    /// Email address, if the token carried one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Role names from the token
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    /// Create from verified claims.
    pub fn from_claims(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            roles: claims.roles,
        }
    }
}
