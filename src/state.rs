// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::TokenVerifier;
use crate::providers::cognito::IdpClient;
use crate::providers::s3::ObjectStore;
use crate::store::InMemoryStore;

/// Auth dependencies shared across requests.
///
/// The verifier (and the key source inside it) is created once at startup
/// and torn down with the process; there is no ambient global key cache.
#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<TokenVerifier>,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<InMemoryStore>>,
    pub auth: AuthState,
    /// Identity provider client; absent when the deployment has not
    /// configured provider credentials (auth endpoints then return 503).
    pub idp: Option<Arc<IdpClient>>,
    /// Object storage for uploaded images; absent when unconfigured.
    pub media: Option<Arc<ObjectStore>>,
}

impl AppState {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            store: Arc::new(RwLock::new(InMemoryStore::new())),
            auth: AuthState {
                verifier: Arc::new(verifier),
            },
            idp: None,
            media: None,
        }
    }

    pub fn with_idp(mut self, idp: IdpClient) -> Self {
        self.idp = Some(Arc::new(idp));
        self
    }

    pub fn with_media(mut self, media: ObjectStore) -> Self {
        self.media = Some(Arc::new(media));
        self
    }

    /// State wired against a loopback JWKS endpoint, for tests.
    #[cfg(test)]
    pub async fn for_tests(jwks_url: &str) -> Self {
        use crate::auth::testing::TEST_ISSUER;
        use crate::auth::KeySource;

        Self::new(TokenVerifier::new(KeySource::new(jwks_url), TEST_ISSUER))
    }
}
