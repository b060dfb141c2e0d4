// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching, caching and key resolution.
//!
//! Token verification only needs one capability: turn a `kid` into a public
//! key. That capability is the [`KeyResolver`] trait, with two
//! implementations:
//!
//! - [`JwksManager`] fetches the remote key set, caches it for a TTL and
//!   limits how often the endpoint may be hit (rolling one-minute budget).
//!   An unknown `kid` on a fresh cache triggers a refetch so key rotation is
//!   picked up, as long as the budget allows it. When a fetch fails or the
//!   budget is spent, the last cached set is still consulted. Readiness
//!   checks draw on a separate budget so they never starve verification.
//! - [`StaticKeySet`] serves a fixed key set, for tests and offline setups.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::{Mutex, RwLock};

use super::error::AuthError;

/// Default JWKS cache TTL (10 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// Default number of JWKS fetches allowed per rolling minute.
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 5;

/// Fetches per rolling minute available to readiness checks.
const READY_REQUESTS_PER_MINUTE: u32 = 1;

const BUDGET_WINDOW: Duration = Duration::from_secs(60);

/// Resolves a token's key identifier to a verification key.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    /// Return the decoding key and its asymmetric algorithm for `kid`.
    async fn resolve_key(&self, kid: &str) -> Result<(DecodingKey, Algorithm), AuthError>;

    /// Readiness check used by the health endpoint.
    async fn check_ready(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

/// JWKS cache entry.
struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// Rolling-window limit on outbound JWKS requests.
#[derive(Debug)]
struct FetchBudget {
    per_minute: u32,
    recent: VecDeque<Instant>,
}

impl FetchBudget {
    fn new(per_minute: u32) -> Self {
        Self {
            per_minute,
            recent: VecDeque::new(),
        }
    }

    /// Consume one fetch slot if available.
    fn try_acquire(&mut self, now: Instant) -> bool {
        while let Some(oldest) = self.recent.front() {
            if now.duration_since(*oldest) >= BUDGET_WINDOW {
                self.recent.pop_front();
            } else {
                break;
            }
        }
        if self.recent.len() < self.per_minute as usize {
            self.recent.push_back(now);
            true
        } else {
            false
        }
    }
}

/// JWKS manager with caching and a fetch budget.
#[derive(Clone)]
pub struct JwksManager {
    /// JWKS endpoint
    jwks_url: String,
    /// Cache TTL
    cache_ttl: Duration,
    /// Cached JWKS
    cache: Arc<RwLock<Option<CacheEntry>>>,
    /// Outbound request budget for key resolution
    budget: Arc<Mutex<FetchBudget>>,
    /// Outbound request budget for readiness checks
    ready_budget: Arc<Mutex<FetchBudget>>,
    /// HTTP client
    client: reqwest::Client,
}

impl JwksManager {
    /// Create a new JWKS manager.
    ///
    /// # Arguments
    /// - `jwks_url`: The JWKS endpoint URL
    ///   (e.g., `https://auth.example.com/.well-known/jwks.json`)
    pub fn new(jwks_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            jwks_url: jwks_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: Arc::new(RwLock::new(None)),
            budget: Arc::new(Mutex::new(FetchBudget::new(DEFAULT_REQUESTS_PER_MINUTE))),
            ready_budget: Arc::new(Mutex::new(FetchBudget::new(READY_REQUESTS_PER_MINUTE))),
            client,
        })
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Create with a custom fetch budget (requests per rolling minute).
    pub fn with_requests_per_minute(mut self, per_minute: u32) -> Self {
        self.budget = Arc::new(Mutex::new(FetchBudget::new(per_minute)));
        self
    }

    /// Get the JWKS URL.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        matches!(&*cache, Some(entry) if entry.fetched_at.elapsed() < self.cache_ttl)
    }

    /// Look up `kid` in the cache. With `fresh_only`, an expired entry is
    /// ignored.
    async fn cached_key(&self, kid: &str, fresh_only: bool) -> Option<Jwk> {
        let cache = self.cache.read().await;
        let entry = cache.as_ref()?;
        if fresh_only && entry.fetched_at.elapsed() >= self.cache_ttl {
            return None;
        }
        find_key(&entry.jwks, kid).cloned()
    }

    async fn has_cache(&self) -> bool {
        self.cache.read().await.is_some()
    }

    /// Fetch JWKS from the endpoint and store it in the cache.
    async fn fetch_and_store(&self) -> Result<JwkSet, AuthError> {
        let jwks = self.fetch_jwks().await?;
        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            jwks: jwks.clone(),
            fetched_at: Instant::now(),
        });
        tracing::debug!(url = %self.jwks_url, keys = jwks.keys.len(), "JWKS cache refreshed");
        Ok(jwks)
    }

    /// Fetch JWKS from the endpoint.
    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::KeyResolution(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeyResolution(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::KeyResolution(e.to_string()))
    }

    async fn try_acquire_fetch(&self) -> bool {
        self.budget.lock().await.try_acquire(Instant::now())
    }
}

#[async_trait]
impl KeyResolver for JwksManager {
    async fn resolve_key(&self, kid: &str) -> Result<(DecodingKey, Algorithm), AuthError> {
        if let Some(jwk) = self.cached_key(kid, true).await {
            return jwk_to_decoding_key(&jwk);
        }

        if self.try_acquire_fetch().await {
            match self.fetch_and_store().await {
                Ok(jwks) => {
                    let jwk = find_key(&jwks, kid).ok_or(AuthError::NoMatchingKey)?;
                    return jwk_to_decoding_key(jwk);
                }
                Err(e) => {
                    tracing::warn!(
                        url = %self.jwks_url,
                        error = %log_detail(&e),
                        "JWKS fetch failed"
                    );
                    match self.cached_key(kid, false).await {
                        Some(jwk) => return jwk_to_decoding_key(&jwk),
                        None => return Err(e),
                    }
                }
            }
        }

        tracing::debug!(kid = %kid, "JWKS fetch budget exhausted, using cached key set");
        match self.cached_key(kid, false).await {
            Some(jwk) => jwk_to_decoding_key(&jwk),
            None if self.has_cache().await => Err(AuthError::NoMatchingKey),
            None => Err(AuthError::KeyResolution(
                "JWKS fetch budget exhausted and no cached key set".to_string(),
            )),
        }
    }

    /// Ready once any key set has been cached, fresh or stale. Only an empty
    /// cache triggers a fetch, and that fetch uses the readiness budget.
    async fn check_ready(&self) -> Result<(), AuthError> {
        if self.has_cache().await {
            return Ok(());
        }
        if self.ready_budget.lock().await.try_acquire(Instant::now()) {
            self.fetch_and_store().await.map(|_| ())
        } else {
            Err(AuthError::KeyResolution("No JWKS cached yet".to_string()))
        }
    }
}

fn log_detail(e: &AuthError) -> String {
    match e {
        AuthError::KeyResolution(detail) => detail.clone(),
        other => other.to_string(),
    }
}

/// A fixed key set. Never touches the network.
#[derive(Clone)]
pub struct StaticKeySet {
    jwks: JwkSet,
}

impl StaticKeySet {
    pub fn new(jwks: JwkSet) -> Self {
        Self { jwks }
    }

    /// Parse a key set from its JSON document form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }
}

#[async_trait]
impl KeyResolver for StaticKeySet {
    async fn resolve_key(&self, kid: &str) -> Result<(DecodingKey, Algorithm), AuthError> {
        let jwk = find_key(&self.jwks, kid).ok_or(AuthError::NoMatchingKey)?;
        jwk_to_decoding_key(jwk)
    }
}

fn find_key<'a>(jwks: &'a JwkSet, kid: &str) -> Option<&'a Jwk> {
    jwks.keys
        .iter()
        .find(|k| k.common.key_id.as_deref() == Some(kid))
}

/// Convert a JWK to a DecodingKey. Only asymmetric keys are accepted.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), AuthError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| AuthError::KeyResolution(format!("Failed to create RSA key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                Some(KeyAlgorithm::PS256) => Algorithm::PS256,
                Some(KeyAlgorithm::PS384) => Algorithm::PS384,
                Some(KeyAlgorithm::PS512) => Algorithm::PS512,
                _ => Algorithm::RS256,
            };

            Ok((key, alg))
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| AuthError::KeyResolution(format!("Failed to create EC key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                _ => Algorithm::ES256,
            };

            Ok((key, alg))
        }
        _ => Err(AuthError::KeyResolution(
            "Unsupported key type in JWKS".to_string(),
        )),
    }
}
