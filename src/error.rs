// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! HTTP-facing error type for business endpoints.
//!
//! Auth failures short-circuit in the gateway and carry their own response
//! shape; everything downstream converts into [`ApiError`]. Store, identity
//! provider and object storage errors each map here so handlers can use `?`
//! throughout. Outbound-dependency failures become 502/503, never 401 - an
//! unreachable collaborator says nothing about the caller's credentials.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::providers::cognito::IdpError;
use crate::providers::s3::ObjectStoreError;
use crate::store::StoreError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::NotFound { .. } => Self::not_found(err.to_string()),
            StoreError::OwnershipMismatch { .. } => Self::forbidden(err.to_string()),
            StoreError::Conflict(_) => Self::conflict(err.to_string()),
            StoreError::InvalidInput(_) => Self::bad_request(err.to_string()),
        }
    }
}

impl From<IdpError> for ApiError {
    fn from(err: IdpError) -> Self {
        match &err {
            // The provider rejected the operation itself (bad code, unknown
            // user, password policy); relay its message as a client error.
            IdpError::Rejected { message, .. } => Self::bad_request(message.clone()),
            IdpError::MissingConfig(_) => Self::service_unavailable(err.to_string()),
            IdpError::Request(_) | IdpError::InvalidResponse(_) => {
                Self::bad_gateway(err.to_string())
            }
        }
    }
}

impl From<ObjectStoreError> for ApiError {
    fn from(err: ObjectStoreError) -> Self {
        match &err {
            ObjectStoreError::MissingConfig(_) => Self::service_unavailable(err.to_string()),
            ObjectStoreError::UnsupportedMediaType(_) => {
                Self::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, err.to_string())
            }
            ObjectStoreError::Request(_) | ObjectStoreError::Upload(_) => {
                Self::bad_gateway(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let forbidden = ApiError::forbidden("not yours");
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn store_errors_map_to_expected_statuses() {
        let err: ApiError = StoreError::NotFound { resource: "trip" }.into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err: ApiError = StoreError::OwnershipMismatch { resource: "trip" }.into();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let err: ApiError = StoreError::Conflict("dup".into()).into();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err: ApiError = StoreError::InvalidInput("bad".into()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }
}
