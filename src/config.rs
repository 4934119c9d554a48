// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `IDP_ISSUER_URL` | Expected token issuer (identity provider pool URL) | Required |
//! | `IDP_JWKS_URL` | Signing key set endpoint | `<issuer>/.well-known/jwks.json` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |
//!
//! The identity provider client and object storage client read their own
//! credentials from the environment (see `providers::cognito` and
//! `providers::s3`); the server runs without them, degrading the endpoints
//! that need them to 503.

use url::Url;

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the expected token issuer URL.
pub const ISSUER_URL_ENV: &str = "IDP_ISSUER_URL";

/// Environment variable name for the signing key set URL override.
pub const JWKS_URL_ENV: &str = "IDP_JWKS_URL";

/// Environment variable name for the log format selector.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{name} is not a valid URL: {source}")]
    InvalidUrl {
        name: &'static str,
        source: url::ParseError,
    },

    #[error("{0} is not a valid port number")]
    InvalidPort(String),
}

/// Server configuration resolved from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Expected `iss` claim; compared exactly during verification.
    pub issuer_url: Url,
    /// Where the provider publishes its signing keys.
    pub jwks_url: Url,
    /// `json` or `pretty` log output.
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var(HOST_ENV).unwrap_or_else(|_| "0.0.0.0".to_string());
        let port_raw = std::env::var(PORT_ENV).unwrap_or_else(|_| "8080".to_string());
        let port: u16 = port_raw
            .parse()
            .map_err(|_| ConfigError::InvalidPort(port_raw))?;

        let issuer_raw =
            std::env::var(ISSUER_URL_ENV).map_err(|_| ConfigError::Missing(ISSUER_URL_ENV))?;
        let issuer_url = Url::parse(&issuer_raw).map_err(|source| ConfigError::InvalidUrl {
            name: ISSUER_URL_ENV,
            source,
        })?;

        let jwks_url = match std::env::var(JWKS_URL_ENV) {
            Ok(raw) => Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl {
                name: JWKS_URL_ENV,
                source,
            })?,
            Err(_) => default_jwks_url(&issuer_url),
        };

        let log_json = std::env::var(LOG_FORMAT_ENV)
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            host,
            port,
            issuer_url,
            jwks_url,
            log_json,
        })
    }

    /// The issuer string tokens must carry, without a trailing slash.
    pub fn issuer(&self) -> String {
        self.issuer_url.as_str().trim_end_matches('/').to_string()
    }
}

/// Providers publish their key set under a well-known path below the issuer.
fn default_jwks_url(issuer: &Url) -> Url {
    let base = issuer.as_str().trim_end_matches('/');
    Url::parse(&format!("{base}/.well-known/jwks.json")).expect("issuer URL joins with known path")
}
