// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! Admin endpoints for account moderation.
//!
//! The whole `/v1/admin` subtree sits behind the gateway middleware pair
//! (authenticate, then admin role check); handlers here never see an
//! unauthenticated or non-admin request.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    auth::Auth,
    error::ApiError,
    providers::cognito::IdpUser,
    state::AppState,
};

use super::{idp, MessageResponse};

/// List all accounts (admin).
#[utoipa::path(
    get,
    path = "/v1/admin/users",
    tag = "Admin",
    security(("bearer" = [])),
    responses((status = 200, body = [IdpUser]), (status = 401), (status = 403))
)]
pub async fn list_users(
    Auth(_ctx): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<IdpUser>>, ApiError> {
    Ok(Json(idp(&state)?.list_users().await?))
}

/// List accounts awaiting validation (admin).
#[utoipa::path(
    get,
    path = "/v1/admin/users/pending",
    tag = "Admin",
    security(("bearer" = [])),
    responses((status = 200, body = [IdpUser]), (status = 401), (status = 403))
)]
pub async fn list_pending_users(
    Auth(_ctx): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<IdpUser>>, ApiError> {
    Ok(Json(idp(&state)?.list_pending_validation_users().await?))
}

/// Mark a driver or agency account as validated (admin).
#[utoipa::path(
    patch,
    path = "/v1/admin/users/{username}/validate",
    params(("username" = String, Path, description = "Identity provider username")),
    tag = "Admin",
    security(("bearer" = [])),
    responses((status = 200, body = MessageResponse), (status = 401), (status = 403))
)]
pub async fn validate_user(
    Auth(_ctx): Auth,
    Path(username): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    idp(&state)?.validate_user(&username).await?;
    Ok(Json(MessageResponse::new(format!(
        "user {username} validated"
    ))))
}

/// Mark an account as identity-verified (admin).
#[utoipa::path(
    patch,
    path = "/v1/admin/users/{username}/verify",
    params(("username" = String, Path, description = "Identity provider username")),
    tag = "Admin",
    security(("bearer" = [])),
    responses((status = 200, body = MessageResponse), (status = 401), (status = 403))
)]
pub async fn verify_user(
    Auth(_ctx): Auth,
    Path(username): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    idp(&state)?.verify_user(&username).await?;
    Ok(Json(MessageResponse::new(format!(
        "user {username} verified"
    ))))
}
