// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! Ownership enforcement for resource mutations.
//!
//! Mutating a trip, vehicle or review requires being its creator or holding
//! the admin role. This is a separate layer from role policy: role checks
//! gate whole operations, ownership compares the requester's subject id
//! against the resource's recorded creator.

use crate::auth::IdentityContext;
use crate::store::StoreError;

/// Trait for resources that record their creator.
pub trait OwnedResource {
    /// Resource name used in error messages ("trip", "vehicle", ...).
    fn resource_name(&self) -> &'static str;

    /// Subject id of the principal that created this resource.
    fn owner_subject_id(&self) -> &str;
}

/// Trait for enforcing ownership on mutations.
pub trait OwnershipEnforcer {
    /// Allow the mutation when the requester owns the resource or is an
    /// admin.
    ///
    /// # Errors
    /// Returns [`StoreError::OwnershipMismatch`] otherwise. This is a
    /// 403-class outcome distinct from both auth errors and not-found.
    fn authorize_mutation(&self, ctx: &IdentityContext) -> Result<(), StoreError>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn authorize_mutation(&self, ctx: &IdentityContext) -> Result<(), StoreError> {
        if self.owner_subject_id() == ctx.subject_id || ctx.is_admin() {
            Ok(())
        } else {
            Err(StoreError::OwnershipMismatch {
                resource: self.resource_name(),
            })
        }
    }
}
