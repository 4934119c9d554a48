// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! # API Data Models
//!
//! Request and response data structures for the REST API. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for JSON handling and OpenAPI
//! documentation.
//!
//! Ownership convention: trips carry `created_by_id` and vehicles/reviews
//! carry `user_id`, each holding the creating principal's subject id. These
//! fields are the join between authentication and business data; mutation
//! endpoints compare them against the requester's identity.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// =============================================================================
// Trips
// =============================================================================

/// Trip moderation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    /// Awaiting admin validation; not shown in public listings.
    Pending,
    /// Validated by an admin and publicly listed.
    Validated,
}

/// A published ride offer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Trip {
    /// Unique identifier for this trip.
    pub id: Uuid,
    /// Departure city or address.
    pub departure: String,
    /// Arrival city or address.
    pub arrival: String,
    /// Scheduled departure time.
    pub departure_date: DateTime<Utc>,
    /// Number of seats still bookable.
    pub seats_available: u32,
    /// Price per seat.
    pub price: f64,
    /// Moderation status.
    pub status: TripStatus,
    /// The vehicle assigned to this trip.
    pub vehicle_id: Uuid,
    /// Subject id of the driver or agency that created the trip.
    pub created_by_id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Request to create a trip.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateTripRequest {
    pub departure: String,
    pub arrival: String,
    pub departure_date: DateTime<Utc>,
    pub seats_available: u32,
    pub price: f64,
    /// Vehicle to assign; must belong to the caller and not already be on a
    /// pending trip.
    pub vehicle_id: Uuid,
}

/// Request to update a trip. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateTripRequest {
    pub departure: Option<String>,
    pub arrival: Option<String>,
    pub departure_date: Option<DateTime<Utc>>,
    pub seats_available: Option<u32>,
    pub price: Option<f64>,
}

/// Search filters for the public trip listing.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct TripQuery {
    /// Exact-match departure filter.
    pub departure: Option<String>,
    /// Exact-match arrival filter.
    pub arrival: Option<String>,
    /// Keep only trips departing on this calendar day (UTC).
    pub departure_date: Option<NaiveDate>,
}

// =============================================================================
// Vehicles
// =============================================================================

/// A vehicle registered by a driver or agency.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Vehicle {
    /// Unique identifier for this vehicle.
    pub id: Uuid,
    /// Display name (e.g. "Blue Transit 9-seater").
    pub name: String,
    /// Passenger capacity.
    pub capacity: u32,
    /// License plate; unique across the fleet.
    pub registration_number: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Uploaded photo URL, if any.
    pub image_url: Option<String>,
    /// Subject id of the owner.
    pub user_id: String,
    /// Whether an admin has validated this vehicle.
    pub is_validated: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Request to register a vehicle.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateVehicleRequest {
    pub name: String,
    pub capacity: u32,
    pub registration_number: String,
    pub description: Option<String>,
}

/// Request to update a vehicle. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateVehicleRequest {
    pub name: Option<String>,
    pub capacity: Option<u32>,
    pub description: Option<String>,
}

// =============================================================================
// Trip Reviews
// =============================================================================

/// A rider's review of a completed trip.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct TripReview {
    /// Unique identifier for this review.
    pub id: Uuid,
    /// The reviewed trip.
    pub trip_id: Uuid,
    /// Subject id of the reviewer.
    pub user_id: String,
    /// Rating from 1.0 to 5.0.
    pub rating: f32,
    /// Optional free-form comment.
    pub comment: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Request to review a trip.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    /// Rating from 1.0 to 5.0.
    pub rating: f32,
    pub comment: Option<String>,
}
