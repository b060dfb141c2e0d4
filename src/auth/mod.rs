// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! JWT bearer authentication for the file API.
//!
//! ## Auth Flow
//!
//! 1. Client sends `Authorization: Bearer <JWT>`
//! 2. Server:
//!    - Reads the `kid` from the token header
//!    - Resolves the public key through a [`KeyResolver`] (remote JWKS,
//!      cached and rate limited)
//!    - Verifies signature, expiry, issuer, audience
//!    - Extracts `sub` → `user_id`, plus `email` and `roles`
//!
//! ## Security
//!
//! - Only asymmetric keys (RSA, EC) are accepted
//! - Failure responses never include key material or fetch detail
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_keys;

pub use claims::AuthenticatedUser;
pub use error::AuthError;
pub use extractor::Auth;
pub use jwks::{JwksManager, KeyResolver, StaticKeySet};
pub use verifier::TokenVerifier;
