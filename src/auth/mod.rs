// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! # Authentication Module
//!
//! Identity-provider JWT authentication and role-based authorization for
//! the Ridepool API.
//!
//! ## Request flow
//!
//! 1. Client authenticates against the identity provider and sends
//!    `Authorization: Bearer <access token>`
//! 2. The gateway (middleware or extractor):
//!    - resolves the token's key id against the provider's published JWKS
//!      (cached; refreshed on unknown key id only)
//!    - verifies signature (pinned RS256), issuer and expiry
//!    - normalizes the group claim into the closed [`Role`] set
//!    - attaches the resulting [`IdentityContext`] to the request
//! 3. Role requirements are checked by [`policy`]; ownership checks happen
//!    against `subject_id` in the store layer.
//!
//! ## Security
//!
//! - The identity-provider-issued asymmetric token is the only trust root;
//!   there is no second, locally-issued token path.
//! - The signing algorithm is pinned out-of-band; the token's `alg` header
//!   is never consulted.
//! - Unknown group names are dropped at the boundary, never carried into
//!   policy decisions.

pub mod claims;
pub mod error;
pub mod extractor;
pub mod gateway;
pub mod jwks;
pub mod policy;
pub mod roles;
pub mod verifier;

#[cfg(test)]
pub mod testing;

pub use claims::IdentityContext;
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use jwks::KeySource;
pub use roles::Role;
pub use verifier::TokenVerifier;
