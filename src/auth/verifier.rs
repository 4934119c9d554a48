// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! Bearer token verification.
//!
//! The verifier trusts nothing from the token until its signature checks out
//! against a key resolved by kid from the identity provider's published set.
//! The signing algorithm is pinned to the provider's documented algorithm;
//! the `alg` header of the token is never used to select it, which closes
//! the algorithm-substitution hole.

use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Algorithm, Validation};

use super::claims::{AccessTokenClaims, IdentityContext};
use super::error::AuthError;
use super::jwks::KeySource;

/// The identity provider signs access tokens with RS256 and nothing else.
const ALLOWED_ALGORITHMS: &[Algorithm] = &[Algorithm::RS256];

/// Clock skew tolerance for `exp`, in seconds. Kept small on purpose: hosts
/// are NTP-synced and a generous leeway only extends the life of stolen
/// tokens.
const CLOCK_SKEW_LEEWAY: u64 = 5;

/// Verifies bearer tokens and produces the per-request identity.
///
/// One instance is created at startup and shared; verification is pure
/// computation except for the [`KeySource`] miss path.
#[derive(Clone)]
pub struct TokenVerifier {
    keys: KeySource,
    issuer: String,
}

impl TokenVerifier {
    /// Create a verifier trusting tokens from `issuer`, with keys resolved
    /// through `keys`.
    pub fn new(keys: KeySource, issuer: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
        }
    }

    /// Access the underlying key source (health checks, cache warm-up).
    pub fn key_source(&self) -> &KeySource {
        &self.keys
    }

    /// Verify a compact token string into an [`IdentityContext`].
    ///
    /// On any failure no partial context escapes; the caller gets exactly
    /// one [`AuthError`] variant describing what went wrong.
    pub async fn verify(&self, token: &str) -> Result<IdentityContext, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        // The header is untrusted input; only the kid is taken from it.
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        let kid = header.kid.ok_or(AuthError::MalformedToken)?;

        let key = self.keys.resolve(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.algorithms = ALLOWED_ALGORITHMS.to_vec();
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_issuer(&[&self.issuer]);
        // Access tokens carry no audience claim; audience is not part of
        // this trust decision.
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let data =
            decode::<AccessTokenClaims>(token, &key, &validation).map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
                ErrorKind::InvalidIssuer => AuthError::IssuerMismatch,
                // A token claiming a different algorithm than the pinned one
                // is treated as a forgery attempt, not a format problem.
                ErrorKind::InvalidAlgorithm => AuthError::SignatureInvalid,
                _ => AuthError::MalformedToken,
            })?;

        IdentityContext::from_claims(data.claims, token).ok_or(AuthError::MalformedToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::roles::Role;
    use crate::auth::testing::{
        mint_access_token, mint_token_with, now_epoch, test_jwks, KeyServer,
        OTHER_RSA_PRIVATE_KEY_PEM, TEST_ISSUER, TEST_KID, TEST_RSA_PRIVATE_KEY_PEM,
    };

    async fn verifier() -> (TokenVerifier, KeyServer) {
        let server = KeyServer::spawn(test_jwks()).await;
        let verifier = TokenVerifier::new(KeySource::new(server.url()), TEST_ISSUER);
        (verifier, server)
    }

    #[tokio::test]
    async fn valid_token_verifies_into_context() {
        let (verifier, _server) = verifier().await;
        let token = mint_access_token("subject-1", &["driver"], now_epoch() + 600);

        let ctx = verifier.verify(&token).await.expect("token verifies");
        assert_eq!(ctx.subject_id, "subject-1");
        assert_eq!(ctx.email.as_deref(), Some("subject-1@example.com"));
        assert!(ctx.has_role(Role::Driver));
        assert!(!ctx.is_admin());
    }

    #[tokio::test]
    async fn verify_is_idempotent() {
        let (verifier, _server) = verifier().await;
        let token = mint_access_token("subject-1", &["agency", "admin"], now_epoch() + 600);

        let first = verifier.verify(&token).await.unwrap();
        let second = verifier.verify(&token).await.unwrap();
        assert_eq!(first.subject_id, second.subject_id);
        assert_eq!(first.email, second.email);
        assert_eq!(first.roles, second.roles);
    }

    #[tokio::test]
    async fn empty_token_is_missing() {
        let (verifier, _server) = verifier().await;
        assert_eq!(
            verifier.verify("  ").await.unwrap_err(),
            AuthError::MissingToken
        );
    }

    #[tokio::test]
    async fn garbage_token_is_malformed() {
        let (verifier, _server) = verifier().await;
        assert_eq!(
            verifier.verify("not.a.token").await.unwrap_err(),
            AuthError::MalformedToken
        );
    }

    #[tokio::test]
    async fn token_without_kid_is_malformed() {
        let (verifier, _server) = verifier().await;
        let token = mint_token_with(
            None,
            &serde_json::json!({
                "sub": "s", "iss": TEST_ISSUER, "exp": now_epoch() + 600
            }),
            TEST_RSA_PRIVATE_KEY_PEM,
        );
        assert_eq!(
            verifier.verify(&token).await.unwrap_err(),
            AuthError::MalformedToken
        );
    }

    #[tokio::test]
    async fn unknown_kid_is_rejected() {
        let (verifier, server) = verifier().await;
        let token = mint_token_with(
            Some("retired-key"),
            &serde_json::json!({
                "sub": "s", "iss": TEST_ISSUER, "exp": now_epoch() + 600
            }),
            TEST_RSA_PRIVATE_KEY_PEM,
        );
        assert_eq!(
            verifier.verify(&token).await.unwrap_err(),
            AuthError::UnknownSigningKey
        );
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn wrong_key_signature_is_invalid() {
        let (verifier, _server) = verifier().await;
        // Correct kid, but signed by a key the provider never published.
        let token = mint_token_with(
            Some(TEST_KID),
            &serde_json::json!({
                "sub": "s", "iss": TEST_ISSUER, "exp": now_epoch() + 600
            }),
            OTHER_RSA_PRIVATE_KEY_PEM,
        );
        assert_eq!(
            verifier.verify(&token).await.unwrap_err(),
            AuthError::SignatureInvalid
        );
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let (verifier, _server) = verifier().await;
        let token = mint_access_token("s", &[], now_epoch() - 600);
        assert_eq!(
            verifier.verify(&token).await.unwrap_err(),
            AuthError::TokenExpired
        );
    }

    #[tokio::test]
    async fn issuer_mismatch_is_rejected() {
        let (verifier, _server) = verifier().await;
        let token = mint_token_with(
            Some(TEST_KID),
            &serde_json::json!({
                "sub": "s", "iss": "https://attacker.invalid/pool", "exp": now_epoch() + 600
            }),
            TEST_RSA_PRIVATE_KEY_PEM,
        );
        assert_eq!(
            verifier.verify(&token).await.unwrap_err(),
            AuthError::IssuerMismatch
        );
    }

    #[tokio::test]
    async fn missing_subject_claim_is_malformed() {
        let (verifier, _server) = verifier().await;
        let token = mint_token_with(
            Some(TEST_KID),
            &serde_json::json!({
                "iss": TEST_ISSUER, "exp": now_epoch() + 600
            }),
            TEST_RSA_PRIVATE_KEY_PEM,
        );
        assert_eq!(
            verifier.verify(&token).await.unwrap_err(),
            AuthError::MalformedToken
        );
    }

    #[tokio::test]
    async fn empty_subject_claim_is_malformed() {
        let (verifier, _server) = verifier().await;
        let token = mint_token_with(
            Some(TEST_KID),
            &serde_json::json!({
                "sub": "", "iss": TEST_ISSUER, "exp": now_epoch() + 600
            }),
            TEST_RSA_PRIVATE_KEY_PEM,
        );
        assert_eq!(
            verifier.verify(&token).await.unwrap_err(),
            AuthError::MalformedToken
        );
    }

    #[tokio::test]
    async fn unsigned_token_is_rejected() {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

        let (verifier, _server) = verifier().await;
        // Hand-rolled "alg": "none" token with an empty signature.
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD.encode(
            serde_json::json!({
                "sub": "s", "iss": TEST_ISSUER, "exp": now_epoch() + 600
            })
            .to_string(),
        );
        let token = format!("{header}.{claims}.");

        assert_eq!(
            verifier.verify(&token).await.unwrap_err(),
            AuthError::MalformedToken
        );
    }

    #[tokio::test]
    async fn symmetric_algorithm_substitution_is_rejected() {
        use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

        let (verifier, _server) = verifier().await;
        // Classic downgrade attempt: HS256 keyed with public material, with
        // a kid pointing at a real RSA key. The pinned algorithm list must
        // refuse it regardless of what the header claims.
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(TEST_KID.to_string());
        let token = encode(
            &header,
            &serde_json::json!({
                "sub": "s", "iss": TEST_ISSUER, "exp": now_epoch() + 600
            }),
            &EncodingKey::from_secret(crate::auth::testing::TEST_RSA_N.as_bytes()),
        )
        .unwrap();

        assert_eq!(
            verifier.verify(&token).await.unwrap_err(),
            AuthError::SignatureInvalid
        );
    }

    #[tokio::test]
    async fn key_endpoint_outage_surfaces_as_unavailable() {
        let (verifier, server) = verifier().await;
        server.set_failing(true);
        let token = mint_access_token("s", &[], now_epoch() + 600);
        assert!(matches!(
            verifier.verify(&token).await.unwrap_err(),
            AuthError::KeySourceUnavailable(_)
        ));
    }
}
