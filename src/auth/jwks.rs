// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! Signing key set (JWKS) fetching and caching.
//!
//! ## Lifecycle
//!
//! One [`KeySource`] is created at process start and shared for the life of
//! the process. The cache is populated lazily on the first verification and
//! refreshed only on a key-id miss - there is no timer-driven expiry. The
//! whole set is replaced atomically, so readers never observe a partially
//! updated set.
//!
//! ## Refresh discipline
//!
//! - Concurrent misses collapse into a single in-flight fetch.
//! - A key id that is still absent after a refresh is remembered until the
//!   next successful refresh, so a stream of requests bearing a forged or
//!   retired key id costs at most one outbound fetch.
//! - The fetch runs on a spawned task: abandoning the request that triggered
//!   it does not cancel a refresh other requests may be waiting on.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet};
use jsonwebtoken::DecodingKey;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use super::error::AuthError;

/// Timeout for a single key-set fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Cached key set plus refresh bookkeeping.
struct KeyCache {
    /// Incremented on every successful refresh.
    generation: u64,
    jwks: JwkSet,
    /// Key ids already refreshed for and found absent.
    missing: HashSet<String>,
}

enum Lookup {
    Key(Box<Jwk>),
    KnownMissing,
    /// Not cached; carries the generation the miss was observed against.
    Absent(u64),
}

/// Fetches and caches the identity provider's published signing keys.
#[derive(Clone)]
pub struct KeySource {
    jwks_url: String,
    client: reqwest::Client,
    cache: Arc<RwLock<KeyCache>>,
    /// Serializes refreshes; see `resolve` for the generation check.
    refresh_lock: Arc<Mutex<()>>,
}

impl KeySource {
    /// Create a new key source for the given JWKS endpoint URL.
    pub fn new(jwks_url: impl Into<String>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            client: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            cache: Arc::new(RwLock::new(KeyCache {
                generation: 0,
                jwks: JwkSet { keys: Vec::new() },
                missing: HashSet::new(),
            })),
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Get the JWKS URL.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Resolve a key id to a verification key.
    ///
    /// On a cache miss this refreshes the key set once and retries the
    /// lookup; a second miss is terminal for this verification attempt and
    /// returns [`AuthError::UnknownSigningKey`].
    pub async fn resolve(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        let observed = match self.lookup(kid).await {
            Lookup::Key(jwk) => return decoding_key(&jwk),
            Lookup::KnownMissing => return Err(AuthError::UnknownSigningKey),
            Lookup::Absent(generation) => generation,
        };

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited for the lock.
        match self.lookup(kid).await {
            Lookup::Key(jwk) => return decoding_key(&jwk),
            Lookup::KnownMissing => return Err(AuthError::UnknownSigningKey),
            Lookup::Absent(generation) if generation != observed => {
                // The set was refreshed and this kid is still not in it.
                self.mark_missing(kid).await;
                return Err(AuthError::UnknownSigningKey);
            }
            Lookup::Absent(_) => {}
        }

        self.refresh_detached().await?;

        match self.lookup(kid).await {
            Lookup::Key(jwk) => decoding_key(&jwk),
            _ => {
                warn!(kid, "key id absent from freshly fetched key set");
                self.mark_missing(kid).await;
                Err(AuthError::UnknownSigningKey)
            }
        }
    }

    /// Fetch the key set and replace the cache.
    ///
    /// Public so startup code and health checks can warm the cache eagerly.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let jwks = self.fetch_jwks().await?;
        self.install(jwks).await;
        Ok(())
    }

    /// Whether at least one successful fetch has populated the cache.
    pub async fn is_primed(&self) -> bool {
        self.cache.read().await.generation > 0
    }

    async fn lookup(&self, kid: &str) -> Lookup {
        let cache = self.cache.read().await;
        if let Some(jwk) = cache
            .jwks
            .keys
            .iter()
            .find(|k| k.common.key_id.as_deref() == Some(kid))
        {
            return Lookup::Key(Box::new(jwk.clone()));
        }
        if cache.missing.contains(kid) {
            return Lookup::KnownMissing;
        }
        Lookup::Absent(cache.generation)
    }

    async fn mark_missing(&self, kid: &str) {
        self.cache.write().await.missing.insert(kid.to_string());
    }

    /// Run the refresh on a spawned task so that cancellation of the request
    /// awaiting it leaves the fetch (and cache install) to complete.
    async fn refresh_detached(&self) -> Result<(), AuthError> {
        let this = self.clone();
        tokio::spawn(async move { this.refresh().await })
            .await
            .map_err(|e| AuthError::KeySourceUnavailable(format!("refresh task failed: {e}")))?
    }

    async fn install(&self, jwks: JwkSet) {
        let mut cache = self.cache.write().await;
        cache.generation += 1;
        cache.jwks = jwks;
        // Fresh knowledge invalidates previous negative results.
        cache.missing.clear();
        debug!(generation = cache.generation, keys = cache.jwks.keys.len(), "installed key set");
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::KeySourceUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeySourceUnavailable(format!(
                "HTTP {} from key-set endpoint",
                response.status()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::KeySourceUnavailable(e.to_string()))
    }
}

/// Convert a JWK into a verification key.
///
/// Only RSA keys are accepted; the verification algorithm is pinned by the
/// verifier and never taken from the key or the token.
fn decoding_key(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
            .map_err(|e| AuthError::KeySourceUnavailable(format!("invalid RSA key material: {e}"))),
        _ => Err(AuthError::UnknownSigningKey),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing::{test_jwks, KeyServer, TEST_KID};

    #[tokio::test]
    async fn cache_starts_unprimed() {
        let source = KeySource::new("http://127.0.0.1:1/jwks.json");
        assert!(!source.is_primed().await);
    }

    #[tokio::test]
    async fn resolve_fetches_once_and_caches() {
        let server = KeyServer::spawn(test_jwks()).await;
        let source = KeySource::new(server.url());

        source.resolve(TEST_KID).await.expect("key resolves");
        source.resolve(TEST_KID).await.expect("key resolves again");

        assert_eq!(server.hits(), 1);
        assert!(source.is_primed().await);
    }

    #[tokio::test]
    async fn concurrent_misses_collapse_into_one_fetch() {
        let server = KeyServer::spawn(test_jwks()).await;
        let source = KeySource::new(server.url());

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let source = source.clone();
                tokio::spawn(async move { source.resolve(TEST_KID).await })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().expect("key resolves");
        }

        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn unknown_kid_is_terminal_after_one_refresh() {
        let server = KeyServer::spawn(test_jwks()).await;
        let source = KeySource::new(server.url());

        let err = source.resolve("no-such-kid").await.unwrap_err();
        assert_eq!(err, AuthError::UnknownSigningKey);
        assert_eq!(server.hits(), 1);

        // A repeat of the same forged/retired kid must not refetch.
        let err = source.resolve("no-such-kid").await.unwrap_err();
        assert_eq!(err, AuthError::UnknownSigningKey);
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn rotation_replaces_the_set_atomically() {
        let server = KeyServer::spawn(test_jwks()).await;
        let source = KeySource::new(server.url());

        source.resolve(TEST_KID).await.expect("initial key resolves");

        // Rotate: the provider now publishes a different key id.
        let rotated = crate::auth::testing::jwks_with_kid("rotated-key");
        server.set_keys(rotated).await;

        source
            .resolve("rotated-key")
            .await
            .expect("rotated key resolves after refresh");

        // The old kid is gone from the replaced set.
        let err = source.resolve(TEST_KID).await.unwrap_err();
        assert_eq!(err, AuthError::UnknownSigningKey);
        assert_eq!(server.hits(), 3);
    }

    #[tokio::test]
    async fn fetch_failure_is_key_source_unavailable() {
        let server = KeyServer::spawn(test_jwks()).await;
        server.set_failing(true);
        let source = KeySource::new(server.url());

        let err = source.resolve(TEST_KID).await.unwrap_err();
        assert!(matches!(err, AuthError::KeySourceUnavailable(_)));

        // The endpoint recovering makes the same kid resolvable.
        server.set_failing(false);
        source.resolve(TEST_KID).await.expect("key resolves after recovery");
    }

    #[tokio::test]
    async fn non_rsa_keys_are_rejected() {
        let jwks: JwkSet = serde_json::from_value(serde_json::json!({
            "keys": [{
                "kty": "oct",
                "kid": "symmetric-key",
                "k": "c2VjcmV0"
            }]
        }))
        .unwrap();
        let server = KeyServer::spawn(jwks).await;
        let source = KeySource::new(server.url());

        let err = source.resolve("symmetric-key").await.unwrap_err();
        assert_eq!(err, AuthError::UnknownSigningKey);
    }
}
