// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! Request-level authentication gateway.
//!
//! Middleware for protecting whole router subtrees. A request passes through
//! two gates: [`authenticate`] turns the bearer token into an
//! [`IdentityContext`] attached to request extensions (or rejects with a
//! 401/503), then an optional [`require_role_set`] gate checks the subtree's
//! role requirement (or rejects with a 403). Handlers behind the gates can
//! take the context with the [`super::extractor::Auth`] extractor, which
//! reads the extension without re-verifying.
//!
//! Every failure is terminal for the request; any retrying (the single
//! key-set refresh) happens inside the verifier and is invisible here.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::claims::IdentityContext;
use super::error::AuthError;
use super::policy;
use super::roles::Role;
use crate::state::AppState;

/// Pull the bearer token out of the `Authorization` header.
///
/// A missing header (or an empty token after the scheme) is `MissingToken`;
/// a header that is not valid UTF-8 or not a `Bearer` credential is
/// `MalformedToken`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = match headers.get(AUTHORIZATION) {
        Some(value) => value.to_str().map_err(|_| AuthError::MalformedToken)?,
        None => return Err(AuthError::MissingToken),
    };

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedToken)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Authentication middleware: verify the bearer token and attach the
/// resulting identity to the request.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Ok(token) => token.to_string(),
        Err(e) => return e.into_response(),
    };

    match state.auth.verifier.verify(&token).await {
        Ok(ctx) => {
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Authorization middleware: check the attached identity against a required
/// role set. Must run after [`authenticate`] on the same subtree.
pub async fn require_role_set(
    required: &'static [Role],
    request: Request,
    next: Next,
) -> Response {
    let Some(ctx) = request.extensions().get::<IdentityContext>() else {
        // The subtree was wired without `authenticate`; fail closed.
        return AuthError::MissingToken.into_response();
    };

    match policy::require_any(ctx, required) {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}
