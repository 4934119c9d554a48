// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Readiness response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall status ("ok" or "degraded").
    pub status: String,
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Signing key cache state: "ok" once keys have been fetched, "cold"
    /// before the first verification forces a fetch.
    pub signing_keys: String,
    /// Identity provider client: "ok" when configured.
    pub identity_provider: String,
    /// Object storage client: "ok" when configured.
    pub object_storage: String,
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, body = HealthResponse))
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe with component detail.
///
/// A cold signing-key cache is not a failure: keys are fetched lazily on
/// the first verification.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses((status = 200, body = ReadyResponse))
)]
pub async fn readiness(State(state): State<AppState>) -> Json<ReadyResponse> {
    let signing_keys = if state.auth.verifier.key_source().is_primed().await {
        "ok"
    } else {
        "cold"
    };
    let identity_provider = if state.idp.is_some() { "ok" } else { "unconfigured" };
    let object_storage = if state.media.is_some() { "ok" } else { "unconfigured" };

    let degraded = identity_provider != "ok" || object_storage != "ok";

    Json(ReadyResponse {
        status: if degraded { "degraded" } else { "ok" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            signing_keys: signing_keys.to_string(),
            identity_provider: identity_provider.to_string(),
            object_storage: object_storage.to_string(),
        },
    })
}
