// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! Role-based access decisions.
//!
//! Policy is a set intersection over the closed [`Role`] enumeration and
//! nothing more. Case-insensitivity is handled once, at claim normalization,
//! so decisions here compare enum values. There is no role hierarchy:
//! callers that want admin override include [`Role::Admin`] in the required
//! set. Ownership checks are a separate layer in the store, not policy.

use super::claims::IdentityContext;
use super::error::AuthError;
use super::roles::Role;

/// Required set for admin-only operations.
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Required set for trip publishing.
pub const DRIVER_OR_AGENCY: &[Role] = &[Role::Driver, Role::Agency];

/// Whether the identity satisfies the required role set.
///
/// An empty required set means "any authenticated principal". Callers must
/// have already rejected unauthenticated requests; there is no anonymous
/// [`IdentityContext`].
pub fn permits(ctx: &IdentityContext, required: &[Role]) -> bool {
    required.is_empty() || required.iter().any(|role| ctx.has_role(*role))
}

/// [`permits`] as a rejection, for use in handlers and middleware.
pub fn require_any(ctx: &IdentityContext, required: &[Role]) -> Result<(), AuthError> {
    if permits(ctx, required) {
        Ok(())
    } else {
        Err(AuthError::InsufficientRole)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn ctx_with_roles(roles: &[Role]) -> IdentityContext {
        IdentityContext {
            subject_id: "subject-1".to_string(),
            email: None,
            roles: roles.iter().copied().collect::<BTreeSet<_>>(),
            raw_token: "tok".to_string(),
        }
    }

    #[test]
    fn empty_required_set_admits_any_authenticated_principal() {
        assert!(permits(&ctx_with_roles(&[]), &[]));
        assert!(permits(&ctx_with_roles(&[Role::User]), &[]));
    }

    #[test]
    fn admin_requirement_needs_admin_membership() {
        assert!(permits(&ctx_with_roles(&[Role::Admin]), ADMIN_ONLY));
        assert!(!permits(&ctx_with_roles(&[Role::User]), ADMIN_ONLY));
        assert!(!permits(&ctx_with_roles(&[]), ADMIN_ONLY));
    }

    #[test]
    fn no_implicit_hierarchy() {
        // Admin alone does not satisfy a driver/agency requirement.
        assert!(!permits(&ctx_with_roles(&[Role::Admin]), DRIVER_OR_AGENCY));
        assert!(permits(&ctx_with_roles(&[Role::Agency]), DRIVER_OR_AGENCY));
        assert!(permits(&ctx_with_roles(&[Role::Driver, Role::User]), DRIVER_OR_AGENCY));
    }

    #[test]
    fn require_any_maps_to_insufficient_role() {
        let err = require_any(&ctx_with_roles(&[Role::User]), ADMIN_ONLY).unwrap_err();
        assert_eq!(err, AuthError::InsufficientRole);
        assert!(require_any(&ctx_with_roles(&[Role::Admin]), ADMIN_ONLY).is_ok());
    }
}
