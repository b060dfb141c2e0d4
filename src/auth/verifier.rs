// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification.

use std::sync::Arc;

use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Validation};

use super::claims::TokenClaims;
use super::jwks::KeyResolver;
use super::{AuthError, AuthenticatedUser};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Pull the token out of an `Authorization` header value.
///
/// The value must be exactly `Bearer <token>` with a non-empty token that
/// contains no whitespace.
pub fn extract_bearer(header_value: &str) -> Result<&str, AuthError> {
    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?;

    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok(token)
}

/// Verifies bearer tokens against keys from a [`KeyResolver`].
#[derive(Clone)]
pub struct TokenVerifier {
    resolver: Arc<dyn KeyResolver>,
    /// Expected issuer; unchecked when `None`
    issuer: Option<String>,
    /// Expected audience; unchecked when `None`
    audience: Option<String>,
}

impl TokenVerifier {
    pub fn new(resolver: Arc<dyn KeyResolver>) -> Self {
        Self {
            resolver,
            issuer: None,
            audience: None,
        }
    }

    /// Set the expected issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Set the expected audience.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn resolver(&self) -> &Arc<dyn KeyResolver> {
        &self.resolver
    }

    /// Verify `token` and return the identity it carries.
    pub async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        let kid = header.kid.as_deref().ok_or(AuthError::MissingKeyId)?;

        let (decoding_key, algorithm) = self.resolver.resolve_key(kid).await?;

        let mut validation = Validation::new(algorithm);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_nbf = true;

        if let Some(ref issuer) = self.issuer {
            validation.set_issuer(&[issuer]);
        }

        if let Some(ref audience) = self.audience {
            validation.set_audience(&[audience]);
        } else {
            validation.validate_aud = false;
        }

        let token_data =
            decode::<TokenClaims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
                _ => AuthError::MalformedToken,
            })?;

        if token_data.claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidClaims);
        }

        Ok(AuthenticatedUser::from_claims(token_data.claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwks::StaticKeySet;
    use crate::auth::test_keys::{self, AUDIENCE, ISSUER, PRIMARY_KID, PRIMARY_PRIVATE_PEM};

    fn verifier() -> TokenVerifier {
        let keys = StaticKeySet::from_json(&test_keys::jwks_json()).unwrap();
        TokenVerifier::new(Arc::new(keys))
            .with_issuer(ISSUER)
            .with_audience(AUDIENCE)
    }

    #[test]
    fn extract_bearer_accepts_exact_form() {
        assert_eq!(extract_bearer("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
    }

    #[test]
    fn extract_bearer_rejects_other_shapes() {
        for value in ["abc", "bearer abc", "Bearer ", "Bearer  abc", "Bearer a b", "Basic abc"] {
            assert!(
                matches!(extract_bearer(value), Err(AuthError::InvalidAuthHeader)),
                "accepted {value:?}"
            );
        }
    }

    #[tokio::test]
    async fn valid_token_yields_identity() {
        let user = verifier().verify(&test_keys::token_for("user_42")).await.unwrap();
        assert_eq!(user.user_id, "user_42");
        assert_eq!(user.email.as_deref(), Some("user_42@example.test"));
        assert_eq!(user.roles, vec!["listener".to_string()]);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let mut claims = test_keys::claims("user_1");
        claims["exp"] = serde_json::json!(test_keys::now() - 3600);
        let token = test_keys::sign_with(&claims, Some(PRIMARY_KID), PRIMARY_PRIVATE_PEM);

        let err = verifier().verify(&token).await.err().unwrap();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn future_nbf_is_rejected() {
        let mut claims = test_keys::claims("user_1");
        claims["nbf"] = serde_json::json!(test_keys::now() + 3600);
        let token = test_keys::sign_with(&claims, Some(PRIMARY_KID), PRIMARY_PRIVATE_PEM);

        let err = verifier().verify(&token).await.err().unwrap();
        assert!(matches!(err, AuthError::TokenNotYetValid));
    }

    #[tokio::test]
    async fn nbf_within_leeway_is_accepted() {
        let mut claims = test_keys::claims("user_1");
        claims["nbf"] = serde_json::json!(test_keys::now() + 30);
        let token = test_keys::sign_with(&claims, Some(PRIMARY_KID), PRIMARY_PRIVATE_PEM);

        assert!(verifier().verify(&token).await.is_ok());
    }

    #[tokio::test]
    async fn empty_subject_is_rejected() {
        for sub in ["", "   "] {
            let mut claims = test_keys::claims("user_1");
            claims["sub"] = serde_json::json!(sub);
            let token = test_keys::sign_with(&claims, Some(PRIMARY_KID), PRIMARY_PRIVATE_PEM);

            let err = verifier().verify(&token).await.err().unwrap();
            assert!(matches!(err, AuthError::InvalidClaims), "accepted sub {sub:?}");
        }
    }

    #[tokio::test]
    async fn wrong_issuer_is_rejected() {
        let mut claims = test_keys::claims("user_1");
        claims["iss"] = serde_json::json!("https://evil.test");
        let token = test_keys::sign_with(&claims, Some(PRIMARY_KID), PRIMARY_PRIVATE_PEM);

        let err = verifier().verify(&token).await.err().unwrap();
        assert!(matches!(err, AuthError::InvalidIssuer));
    }

    #[tokio::test]
    async fn wrong_audience_is_rejected() {
        let mut claims = test_keys::claims("user_1");
        claims["aud"] = serde_json::json!("another-app");
        let token = test_keys::sign_with(&claims, Some(PRIMARY_KID), PRIMARY_PRIVATE_PEM);

        let err = verifier().verify(&token).await.err().unwrap();
        assert!(matches!(err, AuthError::InvalidAudience));
    }

    #[tokio::test]
    async fn audience_unchecked_when_not_configured() {
        let keys = StaticKeySet::from_json(&test_keys::jwks_json()).unwrap();
        let verifier = TokenVerifier::new(Arc::new(keys));
        let mut claims = test_keys::claims("user_1");
        claims["aud"] = serde_json::json!("another-app");
        let token = test_keys::sign_with(&claims, Some(PRIMARY_KID), PRIMARY_PRIVATE_PEM);

        assert!(verifier.verify(&token).await.is_ok());
    }

    #[tokio::test]
    async fn forged_signature_is_rejected() {
        let token = test_keys::sign_with(
            &test_keys::claims("user_1"),
            Some(PRIMARY_KID),
            test_keys::ROGUE_PRIVATE_PEM,
        );

        let err = verifier().verify(&token).await.err().unwrap();
        assert!(matches!(err, AuthError::InvalidSignature));
    }

    #[tokio::test]
    async fn unknown_kid_is_rejected() {
        let token = test_keys::sign_with(
            &test_keys::claims("user_1"),
            Some("other-key"),
            PRIMARY_PRIVATE_PEM,
        );

        let err = verifier().verify(&token).await.err().unwrap();
        assert!(matches!(err, AuthError::NoMatchingKey));
    }

    #[tokio::test]
    async fn missing_kid_is_rejected() {
        let token = test_keys::sign_with(&test_keys::claims("user_1"), None, PRIMARY_PRIVATE_PEM);

        let err = verifier().verify(&token).await.err().unwrap();
        assert!(matches!(err, AuthError::MissingKeyId));
    }

    #[tokio::test]
    async fn garbage_is_malformed() {
        let err = verifier().verify("not-a-jwt").await.err().unwrap();
        assert!(matches!(err, AuthError::MalformedToken));
    }
}
