// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! Authentication and authorization errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
///
/// Every verification or authorization failure is terminal for the request
/// and maps to a stable machine-readable error code. Credential problems are
/// 401-class, a role shortfall is 403, and a key-set fetch failure is 503
/// because it reflects infrastructure health rather than the credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer token present on the request
    MissingToken,
    /// Token (or Authorization header) is structurally invalid
    MalformedToken,
    /// No key with the token's key id, even after a key-set refresh
    UnknownSigningKey,
    /// Token signature does not validate against the resolved key
    SignatureInvalid,
    /// Token has expired
    TokenExpired,
    /// Token issuer does not match the configured identity provider
    IssuerMismatch,
    /// Key-set endpoint could not be reached or returned garbage
    KeySourceUnavailable(String),
    /// Authenticated, but the required role set is not met
    InsufficientRole,
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
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedToken => "malformed_token",
            AuthError::UnknownSigningKey => "unknown_signing_key",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::TokenExpired => "token_expired",
            AuthError::IssuerMismatch => "issuer_mismatch",
            AuthError::KeySourceUnavailable(_) => "key_source_unavailable",
            AuthError::InsufficientRole => "insufficient_role",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::MalformedToken
            | AuthError::UnknownSigningKey
            | AuthError::SignatureInvalid
            | AuthError::TokenExpired
            | AuthError::IssuerMismatch => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientRole => StatusCode::FORBIDDEN,
            AuthError::KeySourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Bearer token is required"),
            AuthError::MalformedToken => write!(f, "Token is malformed"),
            AuthError::UnknownSigningKey => {
                write!(f, "Token signing key is not in the published key set")
            }
            AuthError::SignatureInvalid => write!(f, "Token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::IssuerMismatch => write!(f, "Token issuer is invalid"),
            AuthError::KeySourceUnavailable(msg) => {
                write!(f, "Failed to fetch signing key set: {msg}")
            }
            AuthError::InsufficientRole => {
                write!(f, "Insufficient role for this operation")
            }
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
