// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! Trip review endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    auth::Auth,
    error::ApiError,
    models::{CreateReviewRequest, TripReview},
    state::AppState,
};

/// Review a trip (any authenticated principal, once per trip).
#[utoipa::path(
    post,
    path = "/v1/trips/{trip_id}/reviews",
    params(("trip_id" = Uuid, Path, description = "Trip identifier")),
    request_body = CreateReviewRequest,
    tag = "Reviews",
    security(("bearer" = [])),
    responses(
        (status = 201, body = TripReview),
        (status = 404, description = "Trip not found"),
        (status = 409, description = "Trip already reviewed by this user"),
    )
)]
pub async fn create_review(
    Auth(ctx): Auth,
    Path(trip_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<TripReview>), ApiError> {
    let mut store = state.store.write().await;
    let review = store.create_review(&ctx, trip_id, request)?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// List reviews for a trip.
#[utoipa::path(
    get,
    path = "/v1/trips/{trip_id}/reviews",
    params(("trip_id" = Uuid, Path, description = "Trip identifier")),
    tag = "Reviews",
    responses((status = 200, body = [TripReview]), (status = 404))
)]
pub async fn list_reviews(
    Path(trip_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Vec<TripReview>>, ApiError> {
    let store = state.store.read().await;
    // Listing a missing trip's reviews is a 404, not an empty list.
    store.trip_by_id(trip_id)?;
    Ok(Json(store.reviews_for_trip(trip_id)))
}
