// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! Current-user endpoints.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{Auth, IdentityContext, Role};

/// Response for GET /v1/users/me
#[derive(Debug, Serialize, ToSchema)]
pub struct UserMeResponse {
    /// The principal's stable subject id.
    pub subject_id: String,
    /// Best-effort contact attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Normalized role memberships.
    pub roles: Vec<Role>,
}

impl From<IdentityContext> for UserMeResponse {
    fn from(ctx: IdentityContext) -> Self {
        Self {
            subject_id: ctx.subject_id,
            email: ctx.email,
            roles: ctx.roles.into_iter().collect(),
        }
    }
}

/// Get the identity and roles of the calling principal.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current user information", body = UserMeResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_current_user(Auth(ctx): Auth) -> Json<UserMeResponse> {
    Json(ctx.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn response_carries_identity_fields() {
        let ctx = IdentityContext {
            subject_id: "subject-1".to_string(),
            email: Some("rider@example.com".to_string()),
            roles: [Role::User, Role::Driver].into_iter().collect::<BTreeSet<_>>(),
            raw_token: "tok".to_string(),
        };

        let response: UserMeResponse = ctx.into();
        assert_eq!(response.subject_id, "subject-1");
        assert_eq!(response.roles, vec![Role::User, Role::Driver]);
    }
}
