// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! Object storage client for uploaded images.
//!
//! Implements the one contract the API needs: upload bytes under a path
//! prefix and get back a public URL. Uploads go to an S3-compatible
//! endpoint with SigV4-signed PUTs and a public-read ACL; URL construction
//! can be overridden for deployments that serve media through a CDN.

use std::time::Duration;

use reqwest::Client;
use uuid::Uuid;

use super::sigv4::{self, Credentials, SigningRequest};

#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("object storage configuration missing: {0}")]
    MissingConfig(String),

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("object storage request failed: {0}")]
    Request(String),

    #[error("object storage upload failed: {0}")]
    Upload(String),
}

#[derive(Debug, Clone)]
pub struct ObjectStore {
    bucket: String,
    region: String,
    credentials: Credentials,
    /// Custom endpoint (tests, S3-compatible stores); path-style addressing
    /// is used when set.
    endpoint: Option<String>,
    /// Base URL returned to clients instead of the raw bucket URL.
    public_base: Option<String>,
    http: Client,
}

impl ObjectStore {
    pub fn is_configured() -> bool {
        required_env_present("AWS_S3_BUCKET")
            && required_env_present("AWS_REGION")
            && required_env_present("AWS_ACCESS_KEY_ID")
            && required_env_present("AWS_SECRET_ACCESS_KEY")
    }

    pub fn from_env() -> Result<Self, ObjectStoreError> {
        let store = Self::new(
            env_required("AWS_S3_BUCKET")?,
            env_required("AWS_REGION")?,
            Credentials {
                access_key_id: env_required("AWS_ACCESS_KEY_ID")?,
                secret_access_key: env_required("AWS_SECRET_ACCESS_KEY")?,
            },
        );
        let store = match std::env::var("S3_ENDPOINT_URL") {
            Ok(endpoint) => store.with_endpoint(endpoint),
            Err(_) => store,
        };
        Ok(match std::env::var("S3_PUBLIC_BASE_URL") {
            Ok(base) => store.with_public_base(base),
            Err(_) => store,
        })
    }

    pub fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            credentials,
            endpoint: None,
            public_base: None,
            http: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into().trim_end_matches('/').to_string());
        self
    }

    pub fn with_public_base(mut self, base: impl Into<String>) -> Self {
        self.public_base = Some(base.into().trim_end_matches('/').to_string());
        self
    }

    /// Upload image bytes under `prefix` and return the public URL.
    pub async fn upload(
        &self,
        data: Vec<u8>,
        content_type: &str,
        prefix: &str,
    ) -> Result<String, ObjectStoreError> {
        let extension = extension_for(content_type)?;
        let key = format!("{prefix}/{}{extension}", Uuid::new_v4());

        let (upload_url, host, path) = self.object_location(&key);

        let amz_date = chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let content_sha256 = sigv4::payload_hash(&data);
        let signed_headers = vec![
            ("content-type".to_string(), content_type.to_string()),
            ("x-amz-acl".to_string(), "public-read".to_string()),
            ("x-amz-content-sha256".to_string(), content_sha256.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        let authorization = sigv4::authorization_header(
            &self.credentials,
            &SigningRequest {
                method: "PUT",
                host: &host,
                path: &path,
                region: &self.region,
                service: "s3",
                amz_date: &amz_date,
                headers: &signed_headers,
                payload: &data,
            },
        );

        let response = self
            .http
            .put(&upload_url)
            .header("content-type", content_type)
            .header("x-amz-acl", "public-read")
            .header("x-amz-content-sha256", content_sha256)
            .header("x-amz-date", amz_date)
            .header("authorization", authorization)
            .body(data)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ObjectStoreError::Upload(format!(
                "HTTP {} from object storage",
                response.status()
            )));
        }

        Ok(match &self.public_base {
            Some(base) => format!("{base}/{key}"),
            None => upload_url,
        })
    }

    /// URL, signing host and canonical path for an object key.
    fn object_location(&self, key: &str) -> (String, String, String) {
        match &self.endpoint {
            Some(endpoint) => {
                let host = endpoint
                    .trim_start_matches("https://")
                    .trim_start_matches("http://")
                    .to_string();
                (
                    format!("{endpoint}/{}/{key}", self.bucket),
                    host,
                    format!("/{}/{key}", self.bucket),
                )
            }
            None => {
                let host = format!("{}.s3.{}.amazonaws.com", self.bucket, self.region);
                (format!("https://{host}/{key}"), host, format!("/{key}"))
            }
        }
    }
}

fn extension_for(content_type: &str) -> Result<&'static str, ObjectStoreError> {
    match content_type {
        "image/jpeg" => Ok(".jpg"),
        "image/png" => Ok(".png"),
        "image/webp" => Ok(".webp"),
        "image/gif" => Ok(".gif"),
        other => Err(ObjectStoreError::UnsupportedMediaType(other.to_string())),
    }
}

fn required_env_present(name: &str) -> bool {
    std::env::var(name).map(|v| !v.is_empty()).unwrap_or(false)
}

fn env_required(name: &str) -> Result<String, ObjectStoreError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ObjectStoreError::MissingConfig(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Request;
    use axum::routing::put;
    use axum::Router;
    use std::sync::{Arc, Mutex};

    #[test]
    fn known_image_types_map_to_extensions() {
        assert_eq!(extension_for("image/jpeg").unwrap(), ".jpg");
        assert_eq!(extension_for("image/png").unwrap(), ".png");
        assert!(matches!(
            extension_for("application/pdf"),
            Err(ObjectStoreError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn virtual_hosted_location_without_endpoint() {
        let store = ObjectStore::new(
            "media",
            "eu-west-1",
            Credentials {
                access_key_id: "AKIDEXAMPLE".into(),
                secret_access_key: "secret".into(),
            },
        );
        let (url, host, path) = store.object_location("vehicles/abc.jpg");
        assert_eq!(url, "https://media.s3.eu-west-1.amazonaws.com/vehicles/abc.jpg");
        assert_eq!(host, "media.s3.eu-west-1.amazonaws.com");
        assert_eq!(path, "/vehicles/abc.jpg");
    }

    #[tokio::test]
    async fn upload_sends_signed_request_and_returns_url() {
        let seen: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
        let recorded = seen.clone();

        let app = Router::new().route(
            "/{*path}",
            put(move |request: Request| {
                let recorded = recorded.clone();
                async move {
                    let mut headers = Vec::new();
                    for name in ["authorization", "x-amz-acl", "content-type"] {
                        if let Some(value) = request.headers().get(name) {
                            headers.push((name.to_string(), value.to_str().unwrap().to_string()));
                        }
                    }
                    recorded.lock().unwrap().push((
                        request.uri().path().to_string(),
                        format!("{headers:?}"),
                    ));
                    "ok"
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let store = ObjectStore::new(
            "media",
            "eu-west-1",
            Credentials {
                access_key_id: "AKIDEXAMPLE".into(),
                secret_access_key: "secret".into(),
            },
        )
        .with_endpoint(format!("http://{addr}"))
        .with_public_base("https://cdn.example.com");

        let url = store
            .upload(vec![1, 2, 3], "image/png", "vehicles")
            .await
            .expect("upload succeeds");

        assert!(url.starts_with("https://cdn.example.com/vehicles/"));
        assert!(url.ends_with(".png"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (path, headers) = &seen[0];
        assert!(path.starts_with("/media/vehicles/"));
        assert!(headers.contains("AWS4-HMAC-SHA256"));
        assert!(headers.contains("public-read"));
        assert!(headers.contains("image/png"));
    }
}
