// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! Vehicle endpoints.
//!
//! All vehicle routes require authentication; moderation routes require
//! admin. Image upload goes through the object storage collaborator.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    auth::{AdminOnly, Auth},
    error::ApiError,
    models::{CreateVehicleRequest, UpdateVehicleRequest, Vehicle},
    state::AppState,
};

use super::{media, read_image_field};

/// Register a vehicle.
#[utoipa::path(
    post,
    path = "/v1/vehicles",
    request_body = CreateVehicleRequest,
    tag = "Vehicles",
    security(("bearer" = [])),
    responses(
        (status = 201, body = Vehicle),
        (status = 409, description = "Registration number already in use"),
    )
)]
pub async fn create_vehicle(
    Auth(ctx): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<Vehicle>), ApiError> {
    let mut store = state.store.write().await;
    let vehicle = store.create_vehicle(&ctx, request)?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// List the caller's vehicles.
#[utoipa::path(
    get,
    path = "/v1/vehicles/mine",
    tag = "Vehicles",
    security(("bearer" = [])),
    responses((status = 200, body = [Vehicle]))
)]
pub async fn my_vehicles(
    Auth(ctx): Auth,
    State(state): State<AppState>,
) -> Json<Vec<Vehicle>> {
    let store = state.store.read().await;
    Json(store.vehicles_for_owner(&ctx.subject_id))
}

/// List vehicles awaiting validation (admin).
#[utoipa::path(
    get,
    path = "/v1/vehicles/pending",
    tag = "Vehicles",
    security(("bearer" = [])),
    responses((status = 200, body = [Vehicle]), (status = 403))
)]
pub async fn pending_vehicles(
    AdminOnly(_ctx): AdminOnly,
    State(state): State<AppState>,
) -> Json<Vec<Vehicle>> {
    let store = state.store.read().await;
    Json(store.pending_vehicles())
}

/// Validate a vehicle (admin).
#[utoipa::path(
    patch,
    path = "/v1/vehicles/{vehicle_id}/validate",
    params(("vehicle_id" = Uuid, Path, description = "Vehicle identifier")),
    tag = "Vehicles",
    security(("bearer" = [])),
    responses((status = 200, body = Vehicle), (status = 403), (status = 404))
)]
pub async fn validate_vehicle(
    AdminOnly(_ctx): AdminOnly,
    Path(vehicle_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Vehicle>, ApiError> {
    let mut store = state.store.write().await;
    Ok(Json(store.validate_vehicle(vehicle_id)?))
}

/// Update a vehicle (owner or admin).
#[utoipa::path(
    patch,
    path = "/v1/vehicles/{vehicle_id}",
    params(("vehicle_id" = Uuid, Path, description = "Vehicle identifier")),
    request_body = UpdateVehicleRequest,
    tag = "Vehicles",
    security(("bearer" = [])),
    responses((status = 200, body = Vehicle), (status = 403), (status = 404))
)]
pub async fn update_vehicle(
    Auth(ctx): Auth,
    Path(vehicle_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<UpdateVehicleRequest>,
) -> Result<Json<Vehicle>, ApiError> {
    let mut store = state.store.write().await;
    Ok(Json(store.update_vehicle(&ctx, vehicle_id, request)?))
}

/// Delete a vehicle (owner or admin).
#[utoipa::path(
    delete,
    path = "/v1/vehicles/{vehicle_id}",
    params(("vehicle_id" = Uuid, Path, description = "Vehicle identifier")),
    tag = "Vehicles",
    security(("bearer" = [])),
    responses((status = 204), (status = 403), (status = 404))
)]
pub async fn delete_vehicle(
    Auth(ctx): Auth,
    Path(vehicle_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let mut store = state.store.write().await;
    store.delete_vehicle(&ctx, vehicle_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload a vehicle photo (owner or admin).
#[utoipa::path(
    put,
    path = "/v1/vehicles/{vehicle_id}/image",
    params(("vehicle_id" = Uuid, Path, description = "Vehicle identifier")),
    tag = "Vehicles",
    security(("bearer" = [])),
    responses((status = 200, body = Vehicle), (status = 403), (status = 404))
)]
pub async fn upload_vehicle_image(
    Auth(ctx): Auth,
    Path(vehicle_id): Path<Uuid>,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Vehicle>, ApiError> {
    // Check ownership before paying for the upload.
    {
        let store = state.store.read().await;
        let vehicle = store.vehicle_by_id(vehicle_id)?;
        use crate::ownership::OwnershipEnforcer;
        vehicle.authorize_mutation(&ctx)?;
    }

    let (data, content_type) = read_image_field(multipart).await?;
    let url = media(&state)?.upload(data, &content_type, "vehicles").await?;

    let mut store = state.store.write().await;
    Ok(Json(store.set_vehicle_image(&ctx, vehicle_id, url)?))
}
