// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! Account endpoints backed by the identity provider.
//!
//! Registration, sign-in and the password flows are public; session and
//! profile operations require a verified bearer token. Profile reads and
//! updates are made on the caller's behalf with their own token, which the
//! gateway retained on the [`crate::auth::IdentityContext`] for exactly
//! this purpose.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::{Auth, Role},
    error::ApiError,
    providers::cognito::{AuthTokens, RefreshedTokens, UserProfile},
    state::AppState,
};

use super::{idp, media, read_image_field, MessageResponse};

/// Profile attributes a user may change about themselves.
const UPDATABLE_ATTRIBUTES: &[&str] = &[
    "given_name",
    "family_name",
    "phone_number",
    "custom:agencyName",
    "picture",
];

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    /// One of `user`, `driver`, `agency`, `admin`.
    pub role: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    /// Required when `role` is `agency`.
    pub agency_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub username: String,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfirmEmailRequest {
    pub username: String,
    /// Confirmation code received by email.
    pub code: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub username: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub username: String,
    /// Reset code received by email.
    pub code: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
    pub username: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PictureResponse {
    pub picture: String,
}

// ============================================================================
// Registration & sign-in
// ============================================================================

/// Register a new account.
#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    tag = "Auth",
    responses(
        (status = 201, body = RegisterResponse),
        (status = 400, description = "Unknown role or missing agency name"),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let role = Role::parse(&request.role)
        .ok_or_else(|| ApiError::bad_request(format!("unknown role \"{}\"", request.role)))?;
    if role == Role::Agency && request.agency_name.as_deref().unwrap_or("").is_empty() {
        return Err(ApiError::bad_request(
            "agency accounts must provide agency_name",
        ));
    }

    let username = idp(&state)?
        .sign_up(
            &request.email,
            &request.password,
            role,
            request.given_name.as_deref(),
            request.family_name.as_deref(),
            request.agency_name.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            username,
            message: format!("registered in group {role}; please verify your email"),
        }),
    ))
}

/// Sign in and receive a token bundle.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, body = AuthTokens),
        (status = 400, description = "Incorrect credentials"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthTokens>, ApiError> {
    let tokens = idp(&state)?
        .sign_in(&request.email, &request.password)
        .await?;
    Ok(Json(tokens))
}

/// Confirm an email address with the emailed code.
#[utoipa::path(
    post,
    path = "/v1/auth/confirm-email",
    request_body = ConfirmEmailRequest,
    tag = "Auth",
    responses((status = 200, body = MessageResponse))
)]
pub async fn confirm_email(
    State(state): State<AppState>,
    Json(request): Json<ConfirmEmailRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    idp(&state)?
        .confirm_sign_up(&request.username, &request.code)
        .await?;
    Ok(Json(MessageResponse::new("email verified successfully")))
}

/// Start a password reset.
#[utoipa::path(
    post,
    path = "/v1/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    tag = "Auth",
    responses((status = 200, body = MessageResponse))
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    idp(&state)?.forgot_password(&request.username).await?;
    Ok(Json(MessageResponse::new("password reset code sent by email")))
}

/// Complete a password reset.
#[utoipa::path(
    post,
    path = "/v1/auth/reset-password",
    request_body = ResetPasswordRequest,
    tag = "Auth",
    responses((status = 200, body = MessageResponse))
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    idp(&state)?
        .reset_password(&request.username, &request.code, &request.new_password)
        .await?;
    Ok(Json(MessageResponse::new("password reset successfully")))
}

/// Exchange a refresh token for fresh access/id tokens.
///
/// Deliberately public: the access token is usually expired by the time a
/// client refreshes, so gating this behind bearer verification would lock
/// every session out at expiry.
#[utoipa::path(
    post,
    path = "/v1/auth/refresh-token",
    request_body = RefreshTokenRequest,
    tag = "Auth",
    responses((status = 200, body = RefreshedTokens))
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<RefreshedTokens>, ApiError> {
    let tokens = idp(&state)?
        .refresh_tokens(&request.refresh_token, &request.username)
        .await?;
    Ok(Json(tokens))
}

// ============================================================================
// Session & profile
// ============================================================================

/// Sign out of every session.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    tag = "Auth",
    security(("bearer" = [])),
    responses((status = 200, body = MessageResponse), (status = 401))
)]
pub async fn logout(
    Auth(ctx): Auth,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    idp(&state)?.global_sign_out(&ctx.raw_token).await?;
    Ok(Json(MessageResponse::new("signed out of all sessions")))
}

/// Delete the calling principal's account.
#[utoipa::path(
    delete,
    path = "/v1/auth/account",
    tag = "Auth",
    security(("bearer" = [])),
    responses((status = 200, body = MessageResponse), (status = 401))
)]
pub async fn delete_account(
    Auth(ctx): Auth,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    idp(&state)?.admin_delete_user(&ctx.subject_id).await?;
    Ok(Json(MessageResponse::new("account deleted")))
}

/// Get the calling principal's profile attributes.
#[utoipa::path(
    get,
    path = "/v1/auth/profile",
    tag = "Auth",
    security(("bearer" = [])),
    responses((status = 200, body = UserProfile), (status = 401))
)]
pub async fn get_profile(
    Auth(ctx): Auth,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = idp(&state)?.get_user(&ctx.raw_token).await?;
    Ok(Json(profile))
}

/// Update profile attributes. Unknown attributes are ignored.
#[utoipa::path(
    put,
    path = "/v1/auth/profile",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, body = MessageResponse),
        (status = 400, description = "No updatable attribute supplied"),
    )
)]
pub async fn update_profile(
    Auth(ctx): Auth,
    State(state): State<AppState>,
    Json(updates): Json<std::collections::HashMap<String, String>>,
) -> Result<Json<MessageResponse>, ApiError> {
    let attributes: Vec<(&str, &str)> = UPDATABLE_ATTRIBUTES
        .iter()
        .filter_map(|name| {
            updates
                .get(*name)
                .map(|value| (*name, value.as_str()))
        })
        .collect();

    if attributes.is_empty() {
        return Err(ApiError::bad_request("no updatable attribute supplied"));
    }

    idp(&state)?
        .update_user_attributes(&ctx.raw_token, &attributes)
        .await?;
    Ok(Json(MessageResponse::new("profile updated")))
}

/// Upload a profile picture and record its URL on the profile.
#[utoipa::path(
    put,
    path = "/v1/auth/profile/picture",
    tag = "Auth",
    security(("bearer" = [])),
    responses((status = 200, body = PictureResponse), (status = 401))
)]
pub async fn update_profile_picture(
    Auth(ctx): Auth,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PictureResponse>, ApiError> {
    let (data, content_type) = read_image_field(multipart).await?;
    let url = media(&state)?.upload(data, &content_type, "users").await?;

    idp(&state)?
        .update_user_attributes(&ctx.raw_token, &[("picture", url.as_str())])
        .await?;

    Ok(Json(PictureResponse { picture: url }))
}
