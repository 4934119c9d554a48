// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

use std::net::SocketAddr;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ridepool_server::api::router;
use ridepool_server::auth::{KeySource, TokenVerifier};
use ridepool_server::config::Config;
use ridepool_server::providers::cognito::IdpClient;
use ridepool_server::providers::s3::ObjectStore;
use ridepool_server::state::AppState;

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(config.log_json);

    let key_source = KeySource::new(config.jwks_url.as_str());
    let verifier = TokenVerifier::new(key_source.clone(), config.issuer());
    let mut state = AppState::new(verifier);

    if IdpClient::is_configured() {
        match IdpClient::from_env() {
            Ok(idp) => state = state.with_idp(idp),
            Err(e) => warn!("identity provider client disabled: {e}"),
        }
    } else {
        warn!("identity provider credentials absent; account endpoints will answer 503");
    }

    if ObjectStore::is_configured() {
        match ObjectStore::from_env() {
            Ok(media) => state = state.with_media(media),
            Err(e) => warn!("object storage client disabled: {e}"),
        }
    } else {
        warn!("object storage credentials absent; upload endpoints will answer 503");
    }

    // Warm the signing key cache so the first request does not pay for the
    // fetch; a cold start here is not fatal, keys load lazily on demand.
    if let Err(e) = key_source.refresh().await {
        warn!("signing key warm-up failed: {e}");
    }

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Failed to parse bind address");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");

    info!(%addr, "ridepool server listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("shutdown signal received");
}
