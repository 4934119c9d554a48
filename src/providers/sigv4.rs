// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ridepool Maintainers

//! AWS Signature Version 4 request signing.
//!
//! Both outbound collaborators (the identity provider API and object
//! storage) authenticate requests with SigV4. Only the subset these clients
//! need is implemented: POST/PUT with a fixed path, no query string, and a
//! caller-supplied header list.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Static credentials for signing.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// One request to be signed.
///
/// `headers` must use lowercase names and contain every header that will be
/// signed except `host`, which is added here. `amz_date` is the
/// `YYYYMMDD'T'HHMMSS'Z'` timestamp also sent as `x-amz-date`.
pub struct SigningRequest<'a> {
    pub method: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    pub region: &'a str,
    pub service: &'a str,
    pub amz_date: &'a str,
    pub headers: &'a [(String, String)],
    pub payload: &'a [u8],
}

/// Hex-encoded SHA-256 of the request payload.
pub fn payload_hash(payload: &[u8]) -> String {
    hex(&Sha256::digest(payload))
}

/// Compute the `Authorization` header value for the request.
pub fn authorization_header(credentials: &Credentials, request: &SigningRequest<'_>) -> String {
    let mut headers: Vec<(String, String)> = request
        .headers
        .iter()
        .cloned()
        .chain(std::iter::once(("host".to_string(), request.host.to_string())))
        .collect();
    headers.sort_by(|a, b| a.0.cmp(&b.0));

    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{name}:{}\n", value.trim()))
        .collect();
    let signed_headers = headers
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let canonical_request = [
        request.method,
        request.path,
        "", // query string
        &canonical_headers,
        &signed_headers,
        &payload_hash(request.payload),
    ]
    .join("\n");

    let datestamp = &request.amz_date[..8];
    let scope = format!(
        "{datestamp}/{}/{}/aws4_request",
        request.region, request.service
    );
    let string_to_sign = [
        "AWS4-HMAC-SHA256",
        request.amz_date,
        &scope,
        &hex(&Sha256::digest(canonical_request.as_bytes())),
    ]
    .join("\n");

    let signing_key = derive_signing_key(
        &credentials.secret_access_key,
        datestamp,
        request.region,
        request.service,
    );
    let signature = hex(&hmac_sha256(&signing_key, string_to_sign.as_bytes()));

    format!(
        "AWS4-HMAC-SHA256 Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
        credentials.access_key_id
    )
}

fn derive_signing_key(secret: &str, datestamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), datestamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_credentials() -> Credentials {
        Credentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY".to_string(),
        }
    }

    #[test]
    fn payload_hash_matches_reference() {
        assert_eq!(
            payload_hash(br#"{"UserPoolId":"us-east-1_EXAMPLE"}"#),
            "31beebc6d0ef82d9aa400cb5f25a7fcf342f68461402bba209dc0f7d080273b5"
        );
    }

    #[test]
    fn authorization_header_matches_reference_signature() {
        let headers = vec![
            (
                "content-type".to_string(),
                "application/x-amz-json-1.1".to_string(),
            ),
            ("x-amz-date".to_string(), "20150830T123600Z".to_string()),
            (
                "x-amz-target".to_string(),
                "AWSCognitoIdentityProviderService.ListUsers".to_string(),
            ),
        ];
        let request = SigningRequest {
            method: "POST",
            host: "cognito-idp.us-east-1.amazonaws.com",
            path: "/",
            region: "us-east-1",
            service: "cognito-idp",
            amz_date: "20150830T123600Z",
            headers: &headers,
            payload: br#"{"UserPoolId":"us-east-1_EXAMPLE"}"#,
        };

        let authorization = authorization_header(&example_credentials(), &request);
        assert_eq!(
            authorization,
            "AWS4-HMAC-SHA256 \
             Credential=AKIDEXAMPLE/20150830/us-east-1/cognito-idp/aws4_request, \
             SignedHeaders=content-type;host;x-amz-date;x-amz-target, \
             Signature=8e6c86aadd941877169a355c87ce1abfbf7bce26fc3851cb0dddc9fcec87b8ca"
        );
    }

    #[test]
    fn signature_depends_on_the_secret() {
        let headers = vec![("x-amz-date".to_string(), "20150830T123600Z".to_string())];
        let request = SigningRequest {
            method: "POST",
            host: "example.amazonaws.com",
            path: "/",
            region: "us-east-1",
            service: "service",
            amz_date: "20150830T123600Z",
            headers: &headers,
            payload: b"{}",
        };

        let first = authorization_header(&example_credentials(), &request);
        let other = Credentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "another-secret".to_string(),
        };
        let second = authorization_header(&other, &request);
        assert_ne!(first, second);
    }
}
