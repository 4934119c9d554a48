// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles for authorization.
///
/// Roles mirror the identity provider's group names. Group claims arrive as
/// free-form strings and are normalized through [`Role::parse`] before any
/// policy decision; strings that do not match a variant are dropped.
///
/// There is no implicit hierarchy: `Admin` does not satisfy a `Driver`
/// requirement unless the caller includes `Admin` in its required set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular rider account
    User,
    /// Individual driver offering trips
    Driver,
    /// Transport agency managing a fleet
    Agency,
    /// Full administrative access
    Admin,
}

impl Role {
    /// Parse a role from a group-claim string (case-insensitive).
    ///
    /// Returns `None` for unknown names; callers must drop those rather than
    /// carry them verbatim into policy decisions.
    pub fn parse(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "user" => Some(Role::User),
            "driver" => Some(Role::Driver),
            "agency" => Some(Role::Agency),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// The identity provider group name for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Driver => "driver",
            Role::Agency => "agency",
            Role::Admin => "admin",
        }
    }
}

impl Default for Role {
    /// Default role is User (least privilege for authenticated users).
    fn default() -> Self {
        Role::User
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("Driver"), Some(Role::Driver));
        assert_eq!(Role::parse("aGeNcY"), Some(Role::Agency));
        assert_eq!(Role::parse("user"), Some(Role::User));
    }

    #[test]
    fn parse_drops_unknown_names() {
        assert_eq!(Role::parse("superadmin"), None);
        assert_eq!(Role::parse(""), None);
        assert_eq!(Role::parse("admin "), None);
    }

    #[test]
    fn display_round_trips_through_parse() {
        for role in [Role::User, Role::Driver, Role::Agency, Role::Admin] {
            assert_eq!(Role::parse(&role.to_string()), Some(role));
        }
    }

    #[test]
    fn default_role_is_user() {
        assert_eq!(Role::default(), Role::User);
    }
}
