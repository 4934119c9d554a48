// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! Identity provider client (Cognito-compatible JSON 1.1 API).
//!
//! Outbound administrative and sign-in operations the gateway cannot do
//! locally: account creation, password flows, group management, profile
//! reads and updates. None of this runs on the per-request verification hot
//! path - token verification only ever talks to the key-set endpoint.

use std::collections::HashMap;
use std::time::Duration;

use base64ct::{Base64, Encoding};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use sha2::Sha256;
use tracing::info;
use unicode_normalization::UnicodeNormalization;
use utoipa::ToSchema;

use super::sigv4::{self, Credentials, SigningRequest};
use crate::auth::Role;

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

#[derive(Debug, thiserror::Error)]
pub enum IdpError {
    #[error("identity provider configuration missing: {0}")]
    MissingConfig(String),

    #[error("identity provider request failed: {0}")]
    Request(String),

    #[error("{message}")]
    Rejected { kind: String, message: String },

    #[error("identity provider response was invalid: {0}")]
    InvalidResponse(String),
}

/// Token bundle returned by a successful sign-in.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthTokens {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    /// Group memberships at sign-in time, for client-side routing only; the
    /// server re-derives roles from the token on every request.
    pub groups: Vec<String>,
}

/// Tokens returned by a refresh (no new refresh token is issued).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RefreshedTokens {
    pub access_token: String,
    pub id_token: String,
    pub expires_in: i64,
}

/// A user record as the admin endpoints expose it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IdpUser {
    pub username: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub is_validated: bool,
    pub is_verified: bool,
}

/// A principal's profile, read on their behalf with their own token.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfile {
    pub username: String,
    pub attributes: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct IdpClient {
    endpoint: String,
    host: String,
    region: String,
    user_pool_id: String,
    client_id: String,
    client_secret: String,
    credentials: Credentials,
    http: Client,
}

impl IdpClient {
    pub fn is_configured() -> bool {
        required_env_present("AWS_REGION")
            && required_env_present("IDP_USER_POOL_ID")
            && required_env_present("IDP_CLIENT_ID")
            && required_env_present("IDP_CLIENT_SECRET")
            && required_env_present("AWS_ACCESS_KEY_ID")
            && required_env_present("AWS_SECRET_ACCESS_KEY")
    }

    pub fn from_env() -> Result<Self, IdpError> {
        let region = env_required("AWS_REGION")?;
        let default_host = format!("cognito-idp.{region}.amazonaws.com");
        let endpoint = std::env::var("IDP_ENDPOINT_URL")
            .unwrap_or_else(|_| format!("https://{default_host}"));
        let host = endpoint
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
            .to_string();

        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| IdpError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            host,
            region,
            user_pool_id: env_required("IDP_USER_POOL_ID")?,
            client_id: env_required("IDP_CLIENT_ID")?,
            client_secret: env_required("IDP_CLIENT_SECRET")?,
            credentials: Credentials {
                access_key_id: env_required("AWS_ACCESS_KEY_ID")?,
                secret_access_key: env_required("AWS_SECRET_ACCESS_KEY")?,
            },
            http,
        })
    }

    // =========================================================================
    // Registration & sign-in
    // =========================================================================

    /// Register a user, place them in their role group and make the chosen
    /// password permanent.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        role: Role,
        given_name: Option<&str>,
        family_name: Option<&str>,
        agency_name: Option<&str>,
    ) -> Result<String, IdpError> {
        let email = normalize_username(email);

        let mut attributes = vec![
            json!({"Name": "email", "Value": email}),
            json!({"Name": "custom:role", "Value": role.as_str()}),
            json!({"Name": "custom:isValidated", "Value": "false"}),
            json!({"Name": "custom:isVerified", "Value": "false"}),
        ];
        if let Some(given) = given_name {
            attributes.push(json!({"Name": "given_name", "Value": given}));
        }
        if let Some(family) = family_name {
            attributes.push(json!({"Name": "family_name", "Value": family}));
        }
        if let Some(agency) = agency_name {
            attributes.push(json!({"Name": "custom:agencyName", "Value": agency}));
        }

        let created = self
            .send(
                "AdminCreateUser",
                json!({
                    "UserPoolId": self.user_pool_id,
                    "Username": email,
                    "UserAttributes": attributes,
                    "TemporaryPassword": password,
                    "MessageAction": "SUPPRESS",
                }),
            )
            .await?;

        self.add_user_to_group(&email, role.as_str()).await?;

        self.send(
            "AdminSetUserPassword",
            json!({
                "UserPoolId": self.user_pool_id,
                "Username": email,
                "Password": password,
                "Permanent": true,
            }),
        )
        .await?;

        info!(role = %role, "registered user with identity provider");

        created
            .pointer("/User/Username")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| IdpError::InvalidResponse("AdminCreateUser returned no username".into()))
    }

    /// Authenticate a user and return their token bundle plus groups.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthTokens, IdpError> {
        let email = normalize_username(email);

        let response = self
            .send(
                "AdminInitiateAuth",
                json!({
                    "AuthFlow": "ADMIN_NO_SRP_AUTH",
                    "UserPoolId": self.user_pool_id,
                    "ClientId": self.client_id,
                    "AuthParameters": {
                        "USERNAME": email,
                        "PASSWORD": password,
                        "SECRET_HASH": self.secret_hash(&email),
                    },
                }),
            )
            .await?;

        let result = auth_result(&response)?;
        Ok(AuthTokens {
            access_token: string_field(result, "AccessToken")?,
            id_token: string_field(result, "IdToken")?,
            refresh_token: string_field(result, "RefreshToken")?,
            expires_in: result
                .get("ExpiresIn")
                .and_then(Value::as_i64)
                .unwrap_or_default(),
            groups: self.user_groups(&email).await?,
        })
    }

    /// Exchange a refresh token for fresh access/id tokens.
    pub async fn refresh_tokens(
        &self,
        refresh_token: &str,
        username: &str,
    ) -> Result<RefreshedTokens, IdpError> {
        let username = normalize_username(username);

        let response = self
            .send(
                "InitiateAuth",
                json!({
                    "AuthFlow": "REFRESH_TOKEN_AUTH",
                    "ClientId": self.client_id,
                    "AuthParameters": {
                        "REFRESH_TOKEN": refresh_token,
                        "SECRET_HASH": self.secret_hash(&username),
                    },
                }),
            )
            .await?;

        let result = auth_result(&response)?;
        Ok(RefreshedTokens {
            access_token: string_field(result, "AccessToken")?,
            id_token: string_field(result, "IdToken")?,
            expires_in: result
                .get("ExpiresIn")
                .and_then(Value::as_i64)
                .unwrap_or_default(),
        })
    }

    /// Confirm a registration with the emailed code.
    pub async fn confirm_sign_up(&self, username: &str, code: &str) -> Result<(), IdpError> {
        let username = normalize_username(username);
        self.send(
            "ConfirmSignUp",
            json!({
                "ClientId": self.client_id,
                "Username": username,
                "ConfirmationCode": code,
                "SecretHash": self.secret_hash(&username),
            }),
        )
        .await
        .map(drop)
    }

    /// Start a password reset; the provider emails a code.
    pub async fn forgot_password(&self, username: &str) -> Result<(), IdpError> {
        let username = normalize_username(username);
        self.send(
            "ForgotPassword",
            json!({
                "ClientId": self.client_id,
                "Username": username,
                "SecretHash": self.secret_hash(&username),
            }),
        )
        .await
        .map(drop)
    }

    /// Complete a password reset with the emailed code.
    pub async fn reset_password(
        &self,
        username: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), IdpError> {
        let username = normalize_username(username);
        self.send(
            "ConfirmForgotPassword",
            json!({
                "ClientId": self.client_id,
                "Username": username,
                "ConfirmationCode": code,
                "Password": new_password,
                "SecretHash": self.secret_hash(&username),
            }),
        )
        .await
        .map(drop)
    }

    /// Invalidate every session of the token's owner.
    pub async fn global_sign_out(&self, access_token: &str) -> Result<(), IdpError> {
        self.send("GlobalSignOut", json!({"AccessToken": access_token}))
            .await
            .map(drop)
    }

    // =========================================================================
    // Profile (on-behalf-of calls with the caller's own token)
    // =========================================================================

    pub async fn get_user(&self, access_token: &str) -> Result<UserProfile, IdpError> {
        let response = self
            .send("GetUser", json!({"AccessToken": access_token}))
            .await?;

        let username = response
            .get("Username")
            .and_then(Value::as_str)
            .ok_or_else(|| IdpError::InvalidResponse("GetUser returned no username".into()))?
            .to_string();

        let attributes = response
            .get("UserAttributes")
            .and_then(Value::as_array)
            .map(|attrs| {
                attrs
                    .iter()
                    .filter_map(|attr| {
                        Some((
                            attr.get("Name")?.as_str()?.to_string(),
                            attr.get("Value")?.as_str()?.to_string(),
                        ))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(UserProfile {
            username,
            attributes,
        })
    }

    pub async fn update_user_attributes(
        &self,
        access_token: &str,
        attributes: &[(&str, &str)],
    ) -> Result<(), IdpError> {
        self.send(
            "UpdateUserAttributes",
            json!({
                "AccessToken": access_token,
                "UserAttributes": attribute_list(attributes),
            }),
        )
        .await
        .map(drop)
    }

    // =========================================================================
    // Administrative operations
    // =========================================================================

    pub async fn add_user_to_group(&self, username: &str, group: &str) -> Result<(), IdpError> {
        self.send(
            "AdminAddUserToGroup",
            json!({
                "UserPoolId": self.user_pool_id,
                "GroupName": group,
                "Username": username,
            }),
        )
        .await
        .map(drop)
    }

    pub async fn user_groups(&self, username: &str) -> Result<Vec<String>, IdpError> {
        let response = self
            .send(
                "AdminListGroupsForUser",
                json!({
                    "UserPoolId": self.user_pool_id,
                    "Username": username,
                }),
            )
            .await?;

        Ok(response
            .get("Groups")
            .and_then(Value::as_array)
            .map(|groups| {
                groups
                    .iter()
                    .filter_map(|g| g.get("GroupName")?.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default())
    }

    pub async fn admin_update_user_attributes(
        &self,
        username: &str,
        attributes: &[(&str, &str)],
    ) -> Result<(), IdpError> {
        self.send(
            "AdminUpdateUserAttributes",
            json!({
                "UserPoolId": self.user_pool_id,
                "Username": username,
                "UserAttributes": attribute_list(attributes),
            }),
        )
        .await
        .map(drop)
    }

    pub async fn admin_delete_user(&self, username: &str) -> Result<(), IdpError> {
        self.send(
            "AdminDeleteUser",
            json!({
                "UserPoolId": self.user_pool_id,
                "Username": username,
            }),
        )
        .await
        .map(drop)
    }

    pub async fn list_users(&self) -> Result<Vec<IdpUser>, IdpError> {
        let response = self
            .send("ListUsers", json!({"UserPoolId": self.user_pool_id}))
            .await?;
        Ok(parse_users(&response))
    }

    /// Driver and agency accounts an admin has not validated yet.
    pub async fn list_pending_validation_users(&self) -> Result<Vec<IdpUser>, IdpError> {
        Ok(self
            .list_users()
            .await?
            .into_iter()
            .filter(|user| !user.is_validated)
            .collect())
    }

    /// Mark an account as validated (admin action).
    pub async fn validate_user(&self, username: &str) -> Result<(), IdpError> {
        self.admin_update_user_attributes(username, &[("custom:isValidated", "true")])
            .await
    }

    /// Mark an account as identity-verified (admin action).
    pub async fn verify_user(&self, username: &str) -> Result<(), IdpError> {
        self.admin_update_user_attributes(username, &[("custom:isVerified", "true")])
            .await
    }

    // =========================================================================
    // Wire plumbing
    // =========================================================================

    /// The provider requires a keyed hash of the username to prove knowledge
    /// of the client secret alongside every client-level call.
    fn secret_hash(&self, username: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.client_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(username.as_bytes());
        mac.update(self.client_id.as_bytes());
        Base64::encode_string(&mac.finalize().into_bytes())
    }

    async fn send(&self, operation: &str, body: Value) -> Result<Value, IdpError> {
        let payload = body.to_string();
        let amz_date = chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let target = format!("{TARGET_PREFIX}.{operation}");

        let signed_headers = vec![
            ("content-type".to_string(), CONTENT_TYPE.to_string()),
            ("x-amz-date".to_string(), amz_date.clone()),
            ("x-amz-target".to_string(), target.clone()),
        ];
        let authorization = sigv4::authorization_header(
            &self.credentials,
            &SigningRequest {
                method: "POST",
                host: &self.host,
                path: "/",
                region: &self.region,
                service: "cognito-idp",
                amz_date: &amz_date,
                headers: &signed_headers,
                payload: payload.as_bytes(),
            },
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header("content-type", CONTENT_TYPE)
            .header("x-amz-date", amz_date)
            .header("x-amz-target", target)
            .header("authorization", authorization)
            .body(payload)
            .send()
            .await
            .map_err(|e| IdpError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| IdpError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(rejection(operation, status.as_u16(), &text));
        }

        if text.is_empty() {
            return Ok(json!({}));
        }
        serde_json::from_str(&text).map_err(|e| IdpError::InvalidResponse(e.to_string()))
    }
}

/// Normalize a username/email before hashing or sending: compatibility
/// normalization collapses visually equivalent forms the provider would
/// treat as distinct users.
fn normalize_username(raw: &str) -> String {
    raw.trim().nfkc().collect()
}

fn attribute_list(attributes: &[(&str, &str)]) -> Vec<Value> {
    attributes
        .iter()
        .map(|(name, value)| json!({"Name": name, "Value": value}))
        .collect()
}

fn auth_result(response: &Value) -> Result<&Value, IdpError> {
    response.get("AuthenticationResult").ok_or_else(|| {
        IdpError::InvalidResponse("response carried no AuthenticationResult".into())
    })
}

fn string_field(value: &Value, field: &str) -> Result<String, IdpError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| IdpError::InvalidResponse(format!("response missing {field}")))
}

fn rejection(operation: &str, status: u16, body: &str) -> IdpError {
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let kind = parsed
        .get("__type")
        .and_then(Value::as_str)
        .unwrap_or("UnknownError")
        .to_string();
    let message = parsed
        .get("message")
        .or_else(|| parsed.get("Message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{operation} failed with HTTP {status}"));
    IdpError::Rejected { kind, message }
}

fn parse_users(response: &Value) -> Vec<IdpUser> {
    response
        .get("Users")
        .and_then(Value::as_array)
        .map(|users| {
            users
                .iter()
                .filter_map(|user| {
                    let username = user.get("Username")?.as_str()?.to_string();
                    Some(IdpUser {
                        username,
                        email: user_attribute(user, "email"),
                        role: user_attribute(user, "custom:role"),
                        is_validated: user_attribute(user, "custom:isValidated").as_deref()
                            == Some("true"),
                        is_verified: user_attribute(user, "custom:isVerified").as_deref()
                            == Some("true"),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn user_attribute(user: &Value, name: &str) -> Option<String> {
    user.get("Attributes")?
        .as_array()?
        .iter()
        .find(|attr| attr.get("Name").and_then(Value::as_str) == Some(name))?
        .get("Value")?
        .as_str()
        .map(str::to_string)
}

fn required_env_present(name: &str) -> bool {
    std::env::var(name).map(|v| !v.is_empty()).unwrap_or(false)
}

fn env_required(name: &str) -> Result<String, IdpError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| IdpError::MissingConfig(name.to_string()))
}
