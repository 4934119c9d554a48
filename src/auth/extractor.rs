// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! Axum extractors for authenticated identities.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(ctx): Auth) -> impl IntoResponse {
//!     // ctx is the verified IdentityContext
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::claims::IdentityContext;
use super::error::AuthError;
use super::gateway::bearer_token;
use crate::state::AppState;

/// Extractor for authenticated requests.
///
/// If the gateway middleware already authenticated this request the context
/// is taken from request extensions; otherwise the bearer token is verified
/// here. Either way, handlers using this extractor never run for an
/// unauthenticated request.
pub struct Auth(pub IdentityContext);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<IdentityContext>().cloned() {
            return Ok(Auth(ctx));
        }

        let token = bearer_token(&parts.headers)?.to_string();
        let ctx = state.auth.verifier.verify(&token).await?;
        Ok(Auth(ctx))
    }
}

/// Extractor that additionally requires the admin role.
pub struct AdminOnly(pub IdentityContext);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Auth(ctx) = Auth::from_request_parts(parts, state).await?;

        if !ctx.is_admin() {
            return Err(AuthError::InsufficientRole);
        }

        Ok(AdminOnly(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::roles::Role;
    use crate::auth::testing::{mint_access_token, now_epoch, test_jwks, KeyServer};
    use crate::state::AppState;
    use axum::http::Request;
    use std::collections::BTreeSet;

    async fn test_state() -> (AppState, KeyServer) {
        let server = KeyServer::spawn(test_jwks()).await;
        let state = AppState::for_tests(server.url()).await;
        (state, server)
    }

    fn parts_with_token(token: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/test");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn auth_extractor_requires_token() {
        let (state, _server) = test_state().await;
        let mut parts = parts_with_token(None);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn auth_extractor_verifies_bearer_token() {
        let (state, _server) = test_state().await;
        let token = mint_access_token("subject-9", &["user"], now_epoch() + 600);
        let mut parts = parts_with_token(Some(&token));

        let Auth(ctx) = Auth::from_request_parts(&mut parts, &state)
            .await
            .expect("valid token authenticates");
        assert_eq!(ctx.subject_id, "subject-9");
        assert!(ctx.has_role(Role::User));
    }

    #[tokio::test]
    async fn auth_extractor_prefers_gateway_extension() {
        let (state, _server) = test_state().await;
        let mut parts = parts_with_token(None);

        let ctx = IdentityContext {
            subject_id: "from-gateway".to_string(),
            email: None,
            roles: BTreeSet::new(),
            raw_token: "tok".to_string(),
        };
        parts.extensions.insert(ctx);

        let Auth(ctx) = Auth::from_request_parts(&mut parts, &state)
            .await
            .expect("extension satisfies the extractor");
        assert_eq!(ctx.subject_id, "from-gateway");
    }

    #[tokio::test]
    async fn admin_only_rejects_non_admin() {
        let (state, _server) = test_state().await;
        let token = mint_access_token("subject-9", &["driver"], now_epoch() + 600);
        let mut parts = parts_with_token(Some(&token));

        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InsufficientRole)));
    }

    #[tokio::test]
    async fn admin_only_accepts_admin_group_member() {
        let (state, _server) = test_state().await;
        let token = mint_access_token("subject-9", &["Admin"], now_epoch() + 600);
        let mut parts = parts_with_token(Some(&token));

        let AdminOnly(ctx) = AdminOnly::from_request_parts(&mut parts, &state)
            .await
            .expect("admin token authorizes");
        assert!(ctx.is_admin());
    }
}
