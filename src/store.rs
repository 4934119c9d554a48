// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! In-memory repository for trips, vehicles and reviews.
//!
//! The persistence collaborator is consumed through plain create/read/
//! update/delete contracts; this module is the process-local implementation
//! of those contracts. Ownership fields (`created_by_id`, `user_id`) are
//! queryable by exact match, which is all the auth layer needs.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::IdentityContext;
use crate::models::{
    CreateReviewRequest, CreateTripRequest, CreateVehicleRequest, Trip, TripQuery, TripReview,
    TripStatus, UpdateTripRequest, UpdateVehicleRequest, Vehicle,
};
use crate::ownership::{OwnedResource, OwnershipEnforcer};

/// Errors from repository operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    #[error("you can only modify your own {resource}")]
    OwnershipMismatch { resource: &'static str },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidInput(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl OwnedResource for Trip {
    fn resource_name(&self) -> &'static str {
        "trip"
    }

    fn owner_subject_id(&self) -> &str {
        &self.created_by_id
    }
}

impl OwnedResource for Vehicle {
    fn resource_name(&self) -> &'static str {
        "vehicle"
    }

    fn owner_subject_id(&self) -> &str {
        &self.user_id
    }
}

impl OwnedResource for TripReview {
    fn resource_name(&self) -> &'static str {
        "review"
    }

    fn owner_subject_id(&self) -> &str {
        &self.user_id
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    trips: HashMap<Uuid, Trip>,
    vehicles: HashMap<Uuid, Vehicle>,
    reviews: HashMap<Uuid, TripReview>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Vehicles
    // =========================================================================

    pub fn create_vehicle(
        &mut self,
        ctx: &IdentityContext,
        request: CreateVehicleRequest,
    ) -> StoreResult<Vehicle> {
        if request.capacity == 0 {
            return Err(StoreError::InvalidInput(
                "capacity must be at least 1".into(),
            ));
        }
        if request.registration_number.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "registration_number must not be empty".into(),
            ));
        }
        if self
            .vehicles
            .values()
            .any(|v| v.registration_number == request.registration_number)
        {
            return Err(StoreError::Conflict(format!(
                "a vehicle with registration number \"{}\" already exists",
                request.registration_number
            )));
        }

        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            name: request.name,
            capacity: request.capacity,
            registration_number: request.registration_number,
            description: request.description,
            image_url: None,
            user_id: ctx.subject_id.clone(),
            is_validated: false,
            created_at: Utc::now(),
        };
        self.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(vehicle)
    }

    pub fn vehicle_by_id(&self, id: Uuid) -> StoreResult<Vehicle> {
        self.vehicles
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                resource: "vehicle",
            })
    }

    pub fn vehicles_for_owner(&self, subject_id: &str) -> Vec<Vehicle> {
        self.vehicles
            .values()
            .filter(|v| v.user_id == subject_id)
            .cloned()
            .collect()
    }

    pub fn pending_vehicles(&self) -> Vec<Vehicle> {
        self.vehicles
            .values()
            .filter(|v| !v.is_validated)
            .cloned()
            .collect()
    }

    pub fn validate_vehicle(&mut self, id: Uuid) -> StoreResult<Vehicle> {
        let vehicle = self.vehicles.get_mut(&id).ok_or(StoreError::NotFound {
            resource: "vehicle",
        })?;
        vehicle.is_validated = true;
        Ok(vehicle.clone())
    }

    pub fn update_vehicle(
        &mut self,
        ctx: &IdentityContext,
        id: Uuid,
        request: UpdateVehicleRequest,
    ) -> StoreResult<Vehicle> {
        if request.capacity == Some(0) {
            return Err(StoreError::InvalidInput(
                "capacity must be at least 1".into(),
            ));
        }

        let vehicle = self.vehicles.get_mut(&id).ok_or(StoreError::NotFound {
            resource: "vehicle",
        })?;
        vehicle.authorize_mutation(ctx)?;

        if let Some(name) = request.name {
            vehicle.name = name;
        }
        if let Some(capacity) = request.capacity {
            vehicle.capacity = capacity;
        }
        if let Some(description) = request.description {
            vehicle.description = Some(description);
        }
        Ok(vehicle.clone())
    }

    pub fn set_vehicle_image(
        &mut self,
        ctx: &IdentityContext,
        id: Uuid,
        image_url: String,
    ) -> StoreResult<Vehicle> {
        let vehicle = self.vehicles.get_mut(&id).ok_or(StoreError::NotFound {
            resource: "vehicle",
        })?;
        vehicle.authorize_mutation(ctx)?;
        vehicle.image_url = Some(image_url);
        Ok(vehicle.clone())
    }

    pub fn delete_vehicle(&mut self, ctx: &IdentityContext, id: Uuid) -> StoreResult<()> {
        let vehicle = self.vehicles.get(&id).ok_or(StoreError::NotFound {
            resource: "vehicle",
        })?;
        vehicle.authorize_mutation(ctx)?;
        self.vehicles.remove(&id);
        Ok(())
    }

    // =========================================================================
    // Trips
    // =========================================================================

    pub fn create_trip(
        &mut self,
        ctx: &IdentityContext,
        request: CreateTripRequest,
    ) -> StoreResult<Trip> {
        if request.seats_available == 0 {
            return Err(StoreError::InvalidInput(
                "seats_available must be at least 1".into(),
            ));
        }
        if request.price < 0.0 {
            return Err(StoreError::InvalidInput(
                "price must not be negative".into(),
            ));
        }

        if !self.vehicles.contains_key(&request.vehicle_id) {
            return Err(StoreError::NotFound {
                resource: "vehicle",
            });
        }
        let vehicle_busy = self
            .trips
            .values()
            .any(|t| t.vehicle_id == request.vehicle_id && t.status == TripStatus::Pending);
        if vehicle_busy {
            return Err(StoreError::Conflict(
                "this vehicle is already assigned to a pending trip".into(),
            ));
        }

        let trip = Trip {
            id: Uuid::new_v4(),
            departure: request.departure,
            arrival: request.arrival,
            departure_date: request.departure_date,
            seats_available: request.seats_available,
            price: request.price,
            status: TripStatus::Pending,
            vehicle_id: request.vehicle_id,
            created_by_id: ctx.subject_id.clone(),
            created_at: Utc::now(),
        };
        self.trips.insert(trip.id, trip.clone());
        Ok(trip)
    }

    pub fn trip_by_id(&self, id: Uuid) -> StoreResult<Trip> {
        self.trips
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { resource: "trip" })
    }

    /// Publicly listed trips, optionally filtered.
    pub fn validated_trips(&self, query: &TripQuery) -> Vec<Trip> {
        self.trips
            .values()
            .filter(|t| t.status == TripStatus::Validated)
            .filter(|t| {
                query
                    .departure
                    .as_ref()
                    .is_none_or(|d| t.departure.eq_ignore_ascii_case(d))
            })
            .filter(|t| {
                query
                    .arrival
                    .as_ref()
                    .is_none_or(|a| t.arrival.eq_ignore_ascii_case(a))
            })
            .filter(|t| {
                query
                    .departure_date
                    .is_none_or(|d| t.departure_date.date_naive() == d)
            })
            .cloned()
            .collect()
    }

    pub fn pending_trips(&self) -> Vec<Trip> {
        self.trips
            .values()
            .filter(|t| t.status == TripStatus::Pending)
            .cloned()
            .collect()
    }

    pub fn update_trip(
        &mut self,
        ctx: &IdentityContext,
        id: Uuid,
        request: UpdateTripRequest,
    ) -> StoreResult<Trip> {
        if request.seats_available == Some(0) {
            return Err(StoreError::InvalidInput(
                "seats_available must be at least 1".into(),
            ));
        }
        if request.price.is_some_and(|p| p < 0.0) {
            return Err(StoreError::InvalidInput(
                "price must not be negative".into(),
            ));
        }

        let trip = self
            .trips
            .get_mut(&id)
            .ok_or(StoreError::NotFound { resource: "trip" })?;
        trip.authorize_mutation(ctx)?;

        if let Some(departure) = request.departure {
            trip.departure = departure;
        }
        if let Some(arrival) = request.arrival {
            trip.arrival = arrival;
        }
        if let Some(departure_date) = request.departure_date {
            trip.departure_date = departure_date;
        }
        if let Some(seats) = request.seats_available {
            trip.seats_available = seats;
        }
        if let Some(price) = request.price {
            trip.price = price;
        }
        Ok(trip.clone())
    }

    pub fn delete_trip(&mut self, ctx: &IdentityContext, id: Uuid) -> StoreResult<()> {
        let trip = self
            .trips
            .get(&id)
            .ok_or(StoreError::NotFound { resource: "trip" })?;
        trip.authorize_mutation(ctx)?;
        self.trips.remove(&id);
        Ok(())
    }

    pub fn validate_trip(&mut self, id: Uuid) -> StoreResult<Trip> {
        let trip = self
            .trips
            .get_mut(&id)
            .ok_or(StoreError::NotFound { resource: "trip" })?;
        trip.status = TripStatus::Validated;
        Ok(trip.clone())
    }

    // =========================================================================
    // Trip Reviews
    // =========================================================================

    pub fn create_review(
        &mut self,
        ctx: &IdentityContext,
        trip_id: Uuid,
        request: CreateReviewRequest,
    ) -> StoreResult<TripReview> {
        if !(1.0..=5.0).contains(&request.rating) {
            return Err(StoreError::InvalidInput(
                "rating must be between 1.0 and 5.0".into(),
            ));
        }
        if !self.trips.contains_key(&trip_id) {
            return Err(StoreError::NotFound { resource: "trip" });
        }
        let already_reviewed = self
            .reviews
            .values()
            .any(|r| r.trip_id == trip_id && r.user_id == ctx.subject_id);
        if already_reviewed {
            return Err(StoreError::Conflict(
                "you have already reviewed this trip".into(),
            ));
        }

        let review = TripReview {
            id: Uuid::new_v4(),
            trip_id,
            user_id: ctx.subject_id.clone(),
            rating: request.rating,
            comment: request.comment,
            created_at: Utc::now(),
        };
        self.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    pub fn reviews_for_trip(&self, trip_id: Uuid) -> Vec<TripReview> {
        self.reviews
            .values()
            .filter(|r| r.trip_id == trip_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use chrono::TimeZone;
    use std::collections::BTreeSet;

    fn make_ctx(subject_id: &str, roles: &[Role]) -> IdentityContext {
        IdentityContext {
            subject_id: subject_id.to_string(),
            email: None,
            roles: roles.iter().copied().collect::<BTreeSet<_>>(),
            raw_token: "tok".to_string(),
        }
    }

    fn vehicle_request(registration: &str) -> CreateVehicleRequest {
        CreateVehicleRequest {
            name: "Blue Transit".into(),
            capacity: 4,
            registration_number: registration.into(),
            description: None,
        }
    }

    fn trip_request(vehicle_id: Uuid) -> CreateTripRequest {
        CreateTripRequest {
            departure: "Lyon".into(),
            arrival: "Paris".into(),
            departure_date: Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, 0).unwrap(),
            seats_available: 3,
            price: 25.0,
            vehicle_id,
        }
    }

    fn store_with_vehicle(owner: &str) -> (InMemoryStore, Uuid) {
        let mut store = InMemoryStore::new();
        let ctx = make_ctx(owner, &[Role::Driver]);
        let vehicle = store.create_vehicle(&ctx, vehicle_request("AB-123-CD")).unwrap();
        (store, vehicle.id)
    }

    #[test]
    fn duplicate_registration_number_conflicts() {
        let mut store = InMemoryStore::new();
        let ctx = make_ctx("driver-1", &[Role::Driver]);
        store.create_vehicle(&ctx, vehicle_request("AB-123-CD")).unwrap();

        let err = store
            .create_vehicle(&ctx, vehicle_request("AB-123-CD"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn create_trip_requires_existing_vehicle() {
        let mut store = InMemoryStore::new();
        let ctx = make_ctx("driver-1", &[Role::Driver]);
        let err = store.create_trip(&ctx, trip_request(Uuid::new_v4())).unwrap_err();
        assert_eq!(err, StoreError::NotFound { resource: "vehicle" });
    }

    #[test]
    fn vehicle_cannot_be_on_two_pending_trips() {
        let (mut store, vehicle_id) = store_with_vehicle("driver-1");
        let ctx = make_ctx("driver-1", &[Role::Driver]);

        store.create_trip(&ctx, trip_request(vehicle_id)).unwrap();
        let err = store.create_trip(&ctx, trip_request(vehicle_id)).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn validated_vehicle_frees_up_for_new_trips() {
        let (mut store, vehicle_id) = store_with_vehicle("driver-1");
        let ctx = make_ctx("driver-1", &[Role::Driver]);

        let trip = store.create_trip(&ctx, trip_request(vehicle_id)).unwrap();
        store.validate_trip(trip.id).unwrap();
        store
            .create_trip(&ctx, trip_request(vehicle_id))
            .expect("vehicle is free once its trip is validated");
    }

    #[test]
    fn only_owner_or_admin_mutates_a_trip() {
        let (mut store, vehicle_id) = store_with_vehicle("driver-1");
        let owner = make_ctx("driver-1", &[Role::Driver]);
        let stranger = make_ctx("driver-2", &[Role::Driver]);
        let admin = make_ctx("admin-1", &[Role::Admin]);

        let trip = store.create_trip(&owner, trip_request(vehicle_id)).unwrap();

        let err = store.delete_trip(&stranger, trip.id).unwrap_err();
        assert_eq!(err, StoreError::OwnershipMismatch { resource: "trip" });

        let update = UpdateTripRequest {
            price: Some(30.0),
            ..Default::default()
        };
        let err = store.update_trip(&stranger, trip.id, update.clone()).unwrap_err();
        assert_eq!(err, StoreError::OwnershipMismatch { resource: "trip" });

        let updated = store.update_trip(&owner, trip.id, update).unwrap();
        assert_eq!(updated.price, 30.0);

        store.delete_trip(&admin, trip.id).expect("admin may delete any trip");
    }

    #[test]
    fn trip_listing_filters_and_hides_pending() {
        let (mut store, vehicle_id) = store_with_vehicle("driver-1");
        let ctx = make_ctx("driver-1", &[Role::Driver]);

        let pending = store.create_trip(&ctx, trip_request(vehicle_id)).unwrap();
        assert!(store.validated_trips(&TripQuery::default()).is_empty());

        store.validate_trip(pending.id).unwrap();
        assert_eq!(store.validated_trips(&TripQuery::default()).len(), 1);

        let match_query = TripQuery {
            departure: Some("lyon".into()),
            arrival: Some("PARIS".into()),
            departure_date: Some(chrono::NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()),
        };
        assert_eq!(store.validated_trips(&match_query).len(), 1);

        let miss_query = TripQuery {
            departure: Some("Marseille".into()),
            ..Default::default()
        };
        assert!(store.validated_trips(&miss_query).is_empty());
    }

    #[test]
    fn review_requires_valid_rating_and_single_submission() {
        let (mut store, vehicle_id) = store_with_vehicle("driver-1");
        let driver = make_ctx("driver-1", &[Role::Driver]);
        let rider = make_ctx("rider-1", &[Role::User]);

        let trip = store.create_trip(&driver, trip_request(vehicle_id)).unwrap();

        let err = store
            .create_review(
                &rider,
                trip.id,
                CreateReviewRequest {
                    rating: 5.5,
                    comment: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));

        store
            .create_review(
                &rider,
                trip.id,
                CreateReviewRequest {
                    rating: 4.5,
                    comment: Some("smooth ride".into()),
                },
            )
            .unwrap();

        let err = store
            .create_review(
                &rider,
                trip.id,
                CreateReviewRequest {
                    rating: 3.0,
                    comment: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        assert_eq!(store.reviews_for_trip(trip.id).len(), 1);
    }

    #[test]
    fn vehicle_validation_and_pending_listing() {
        let (mut store, vehicle_id) = store_with_vehicle("driver-1");
        assert_eq!(store.pending_vehicles().len(), 1);

        store.validate_vehicle(vehicle_id).unwrap();
        assert!(store.pending_vehicles().is_empty());
        assert!(store.vehicle_by_id(vehicle_id).unwrap().is_validated);
    }
}
