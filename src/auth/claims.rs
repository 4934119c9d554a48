// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! Token claims and the per-request identity they verify into.

use std::collections::BTreeSet;

use serde::Deserialize;

use super::roles::Role;

/// Claims decoded from an identity-provider access token.
///
/// Only the claims the gateway acts on are modeled; everything else in the
/// token is ignored. `exp` and `iss` are additionally enforced by the
/// verifier's `Validation`, the fields here are what gets copied into the
/// [`IdentityContext`].
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject - the canonical principal identifier, stable across refreshes
    pub sub: String,

    /// Expiration timestamp
    pub exp: i64,

    /// Issuer (the identity provider's pool URL)
    pub iss: String,

    /// Best-effort contact attribute; not present on every token shape
    #[serde(default)]
    pub email: Option<String>,

    /// Group memberships assigned in the identity provider
    #[serde(default, rename = "cognito:groups")]
    pub groups: Vec<String>,
}

/// The authenticated identity attached to a request.
///
/// Created per request by the gateway after full token verification; never
/// persisted. `subject_id` is the authorization key throughout the system -
/// `email` is display-only and must not be used for ownership comparisons.
#[derive(Clone)]
pub struct IdentityContext {
    /// Canonical principal id (the token's `sub` claim)
    pub subject_id: String,

    /// Best-effort contact/display attribute
    pub email: Option<String>,

    /// Normalized role set; unknown group names were dropped at the boundary
    pub roles: BTreeSet<Role>,

    /// The original bearer token, kept only for same-request on-behalf-of
    /// calls to the identity provider. Redacted from `Debug` output.
    pub raw_token: String,
}

impl IdentityContext {
    /// Build a context from verified claims.
    ///
    /// Returns `None` when the subject claim is empty - an identity without
    /// a subject is a verification failure, not an anonymous context.
    pub fn from_claims(claims: AccessTokenClaims, raw_token: &str) -> Option<Self> {
        if claims.sub.is_empty() {
            return None;
        }

        let roles = claims
            .groups
            .iter()
            .filter_map(|g| Role::parse(g))
            .collect();

        Some(Self {
            subject_id: claims.sub,
            email: claims.email,
            roles,
            raw_token: raw_token.to_string(),
        })
    }

    /// Check membership of a single role.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Check if this principal is an admin.
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

// The raw token is a live credential; keep it out of logs and panic output.
impl std::fmt::Debug for IdentityContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityContext")
            .field("subject_id", &self.subject_id)
            .field("email", &self.email)
            .field("roles", &self.roles)
            .field("raw_token", &"<redacted>")
            .finish()
    }
}
