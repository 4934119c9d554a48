// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! Trip endpoints.
//!
//! Listing and reading are public; publishing requires the driver or agency
//! role; mutations require ownership (or admin); moderation is admin-only.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    auth::{policy, AdminOnly, Auth},
    error::ApiError,
    models::{CreateTripRequest, Trip, TripQuery, UpdateTripRequest},
    state::AppState,
};

/// Publish a trip (drivers and agencies).
#[utoipa::path(
    post,
    path = "/v1/trips",
    request_body = CreateTripRequest,
    tag = "Trips",
    security(("bearer" = [])),
    responses(
        (status = 201, body = Trip),
        (status = 403, description = "Caller is neither driver nor agency"),
        (status = 404, description = "Vehicle not found"),
        (status = 409, description = "Vehicle already assigned to a pending trip"),
    )
)]
pub async fn create_trip(
    Auth(ctx): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateTripRequest>,
) -> Result<(StatusCode, Json<Trip>), ApiError> {
    policy::require_any(&ctx, policy::DRIVER_OR_AGENCY)
        .map_err(|_| ApiError::forbidden("only drivers and agencies can create trips"))?;

    let mut store = state.store.write().await;
    let trip = store.create_trip(&ctx, request)?;
    Ok((StatusCode::CREATED, Json(trip)))
}

/// List validated trips, optionally filtered.
#[utoipa::path(
    get,
    path = "/v1/trips",
    params(TripQuery),
    tag = "Trips",
    responses((status = 200, body = [Trip]))
)]
pub async fn list_trips(
    State(state): State<AppState>,
    Query(query): Query<TripQuery>,
) -> Json<Vec<Trip>> {
    let store = state.store.read().await;
    Json(store.validated_trips(&query))
}

/// Get a trip by id.
#[utoipa::path(
    get,
    path = "/v1/trips/{trip_id}",
    params(("trip_id" = Uuid, Path, description = "Trip identifier")),
    tag = "Trips",
    responses((status = 200, body = Trip), (status = 404))
)]
pub async fn get_trip(
    Path(trip_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Trip>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.trip_by_id(trip_id)?))
}

/// Update a trip (owner or admin).
#[utoipa::path(
    patch,
    path = "/v1/trips/{trip_id}",
    params(("trip_id" = Uuid, Path, description = "Trip identifier")),
    request_body = UpdateTripRequest,
    tag = "Trips",
    security(("bearer" = [])),
    responses((status = 200, body = Trip), (status = 403), (status = 404))
)]
pub async fn update_trip(
    Auth(ctx): Auth,
    Path(trip_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<UpdateTripRequest>,
) -> Result<Json<Trip>, ApiError> {
    let mut store = state.store.write().await;
    Ok(Json(store.update_trip(&ctx, trip_id, request)?))
}

/// Delete a trip (owner or admin).
#[utoipa::path(
    delete,
    path = "/v1/trips/{trip_id}",
    params(("trip_id" = Uuid, Path, description = "Trip identifier")),
    tag = "Trips",
    security(("bearer" = [])),
    responses((status = 204), (status = 403), (status = 404))
)]
pub async fn delete_trip(
    Auth(ctx): Auth,
    Path(trip_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let mut store = state.store.write().await;
    store.delete_trip(&ctx, trip_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// List trips awaiting validation (admin).
#[utoipa::path(
    get,
    path = "/v1/trips/pending",
    tag = "Trips",
    security(("bearer" = [])),
    responses((status = 200, body = [Trip]), (status = 403))
)]
pub async fn pending_trips(
    AdminOnly(_ctx): AdminOnly,
    State(state): State<AppState>,
) -> Json<Vec<Trip>> {
    let store = state.store.read().await;
    Json(store.pending_trips())
}

/// Validate a trip so it appears in public listings (admin).
#[utoipa::path(
    patch,
    path = "/v1/trips/{trip_id}/validate",
    params(("trip_id" = Uuid, Path, description = "Trip identifier")),
    tag = "Trips",
    security(("bearer" = [])),
    responses((status = 200, body = Trip), (status = 403), (status = 404))
)]
pub async fn validate_trip(
    AdminOnly(_ctx): AdminOnly,
    Path(trip_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Trip>, ApiError> {
    let mut store = state.store.write().await;
    Ok(Json(store.validate_trip(trip_id)?))
}
