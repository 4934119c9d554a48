// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

use std::sync::Arc;

use axum::{
    extract::Multipart,
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{gateway, policy},
    error::ApiError,
    models::{
        CreateReviewRequest, CreateTripRequest, CreateVehicleRequest, Trip, TripReview,
        TripStatus, UpdateTripRequest, UpdateVehicleRequest, Vehicle,
    },
    providers::cognito::{AuthTokens, IdpClient, IdpUser, RefreshedTokens, UserProfile},
    providers::s3::ObjectStore,
    state::AppState,
};

pub mod admin;
pub mod auth;
pub mod health;
pub mod reviews;
pub mod trips;
pub mod users;
pub mod vehicles;

/// Plain acknowledgement body.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The identity provider client, or 503 when the deployment runs without
/// provider credentials.
pub(crate) fn idp(state: &AppState) -> Result<&Arc<IdpClient>, ApiError> {
    state
        .idp
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("identity provider is not configured"))
}

/// The object storage client, or 503 when unconfigured.
pub(crate) fn media(state: &AppState) -> Result<&Arc<ObjectStore>, ApiError> {
    state
        .media
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("object storage is not configured"))
}

/// Pull the first image part out of a multipart upload.
pub(crate) async fn read_image_field(
    mut multipart: Multipart,
) -> Result<(Vec<u8>, String), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        if !matches!(field.name(), Some("picture") | Some("file")) {
            continue;
        }
        let content_type = field
            .content_type()
            .ok_or_else(|| ApiError::bad_request("image part carries no content type"))?
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("failed to read upload: {e}")))?
            .to_vec();
        return Ok((data, content_type));
    }
    Err(ApiError::bad_request(
        "multipart body carries no \"picture\" or \"file\" part",
    ))
}

pub fn router(state: AppState) -> Router {
    // The admin subtree demonstrates the middleware form of the gateway:
    // authenticate, then require the admin role, before any handler runs.
    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/pending", get(admin::list_pending_users))
        .route("/users/{username}/validate", patch(admin::validate_user))
        .route("/users/{username}/verify", patch(admin::verify_user))
        .route_layer(middleware::from_fn(
            |request: axum::extract::Request, next: middleware::Next| {
                gateway::require_role_set(policy::ADMIN_ONLY, request, next)
            },
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            gateway::authenticate,
        ));

    let v1_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/confirm-email", post(auth::confirm_email))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/auth/refresh-token", post(auth::refresh_token))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/account", delete(auth::delete_account))
        .route(
            "/auth/profile",
            get(auth::get_profile).put(auth::update_profile),
        )
        .route("/auth/profile/picture", put(auth::update_profile_picture))
        .route("/users/me", get(users::get_current_user))
        .route("/trips", get(trips::list_trips).post(trips::create_trip))
        .route("/trips/pending", get(trips::pending_trips))
        .route(
            "/trips/{trip_id}",
            get(trips::get_trip)
                .patch(trips::update_trip)
                .delete(trips::delete_trip),
        )
        .route("/trips/{trip_id}/validate", patch(trips::validate_trip))
        .route(
            "/trips/{trip_id}/reviews",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route("/vehicles", post(vehicles::create_vehicle))
        .route("/vehicles/mine", get(vehicles::my_vehicles))
        .route("/vehicles/pending", get(vehicles::pending_vehicles))
        .route(
            "/vehicles/{vehicle_id}",
            patch(vehicles::update_vehicle).delete(vehicles::delete_vehicle),
        )
        .route(
            "/vehicles/{vehicle_id}/validate",
            patch(vehicles::validate_vehicle),
        )
        .route(
            "/vehicles/{vehicle_id}/image",
            put(vehicles::upload_vehicle_image),
        )
        .nest("/admin", admin_routes);

    Router::new()
        .nest("/v1", v1_routes)
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        auth::confirm_email,
        auth::forgot_password,
        auth::reset_password,
        auth::refresh_token,
        auth::logout,
        auth::delete_account,
        auth::get_profile,
        auth::update_profile,
        auth::update_profile_picture,
        users::get_current_user,
        trips::create_trip,
        trips::list_trips,
        trips::get_trip,
        trips::update_trip,
        trips::delete_trip,
        trips::pending_trips,
        trips::validate_trip,
        reviews::create_review,
        reviews::list_reviews,
        vehicles::create_vehicle,
        vehicles::my_vehicles,
        vehicles::pending_vehicles,
        vehicles::validate_vehicle,
        vehicles::update_vehicle,
        vehicles::delete_vehicle,
        vehicles::upload_vehicle_image,
        admin::list_users,
        admin::list_pending_users,
        admin::validate_user,
        admin::verify_user,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Trip,
            TripStatus,
            TripReview,
            Vehicle,
            CreateTripRequest,
            UpdateTripRequest,
            CreateVehicleRequest,
            UpdateVehicleRequest,
            CreateReviewRequest,
            AuthTokens,
            RefreshedTokens,
            IdpUser,
            UserProfile,
            MessageResponse,
            auth::RegisterRequest,
            auth::RegisterResponse,
            auth::LoginRequest,
            auth::ConfirmEmailRequest,
            auth::ForgotPasswordRequest,
            auth::ResetPasswordRequest,
            auth::RefreshTokenRequest,
            auth::PictureResponse,
            users::UserMeResponse,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    tags(
        (name = "Auth", description = "Registration, sign-in and profile"),
        (name = "Users", description = "Current-user identity"),
        (name = "Trips", description = "Trip publishing, search and moderation"),
        (name = "Reviews", description = "Trip reviews"),
        (name = "Vehicles", description = "Vehicle registration and moderation"),
        (name = "Admin", description = "Account moderation"),
        (name = "Health", description = "Probes")
    )
)]
struct ApiDoc;
