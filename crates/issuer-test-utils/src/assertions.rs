//! Custom test assertions for expressive tests
//!
//! Inspect an issued token's header and payload without verifying it.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;

/// JWT header structure
#[derive(Debug, Deserialize)]
struct JwtHeader {
    pub alg: String,
    pub typ: String,
    #[serde(default)]
    pub kid: Option<String>,
}

/// Claims of a token in its wire form
#[derive(Debug, Deserialize)]
pub struct WirePayload {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    #[serde(rename = "IdOng")]
    pub organization_id: String,
    #[serde(rename = "Organizator")]
    pub is_organizer: String,
}

fn segment(token: &str, index: usize) -> Vec<u8> {
    let part = token
        .split('.')
        .nth(index)
        .unwrap_or_else(|| panic!("JWT has no segment {}", index));
    URL_SAFE_NO_PAD
        .decode(part)
        .unwrap_or_else(|e| panic!("Failed to base64 decode JWT segment {}: {}", index, e))
}

/// Decode the payload of an issued token
pub fn decode_payload(token: &str) -> WirePayload {
    serde_json::from_slice(&segment(token, 1)).expect("Failed to parse JWT claims")
}

/// Custom assertions for issued tokens
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_jwt()
///     .assert_for_subject("alice")
///     .assert_organization(7)
///     .assert_signed_by("issuer-key-01");
/// ```
pub trait TokenAssertions {
    /// Assert that the token has the structure this issuer produces
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert that the token was signed under the specified key id
    fn assert_signed_by(&self, key_id: &str) -> &Self;

    /// Assert that the token expires within the specified seconds
    fn assert_expires_in(&self, seconds: u64) -> &Self;

    /// Assert that the token is for the specified subject
    fn assert_for_subject(&self, subject: &str) -> &Self;

    /// Assert the organization claim
    fn assert_organization(&self, organization_id: u32) -> &Self;

    /// Assert the organizer flag
    fn assert_organizer(&self, is_organizer: bool) -> &Self;
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        let parts = self.split('.').count();
        assert_eq!(
            parts, 3,
            "JWT must have 3 parts (header.payload.signature), got {}",
            parts
        );

        let header: JwtHeader =
            serde_json::from_slice(&segment(self, 0)).expect("Failed to parse JWT header JSON");
        assert_eq!(header.alg, "EdDSA", "Expected EdDSA algorithm");
        assert_eq!(header.typ, "JWT", "Expected JWT type");

        let claims = decode_payload(self);
        assert!(!claims.sub.is_empty(), "Subject must not be empty");
        assert!(
            claims.exp > claims.iat,
            "Expiration {} must be after issued-at {}",
            claims.exp,
            claims.iat
        );

        self
    }

    fn assert_signed_by(&self, key_id: &str) -> &Self {
        let header: JwtHeader =
            serde_json::from_slice(&segment(self, 0)).expect("Failed to parse JWT header");

        assert_eq!(
            header.kid.as_deref(),
            Some(key_id),
            "Expected key_id '{}', got {:?}",
            key_id,
            header.kid
        );

        self
    }

    fn assert_expires_in(&self, seconds: u64) -> &Self {
        let claims = decode_payload(self);

        let now = chrono::Utc::now().timestamp();
        let expires_in = claims.exp - now;

        // Allow 5-second tolerance for slow test runs
        assert!(
            (expires_in - seconds as i64).abs() <= 5,
            "Expected token to expire in {} seconds, but expires in {} seconds",
            seconds,
            expires_in
        );

        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        let claims = decode_payload(self);

        assert_eq!(
            claims.sub, subject,
            "Expected subject '{}', got '{}'",
            subject, claims.sub
        );

        self
    }

    fn assert_organization(&self, organization_id: u32) -> &Self {
        let claims = decode_payload(self);

        assert_eq!(
            claims.organization_id,
            organization_id.to_string(),
            "Unexpected organization claim"
        );

        self
    }

    fn assert_organizer(&self, is_organizer: bool) -> &Self {
        let claims = decode_payload(self);
        let expected = if is_organizer { "True" } else { "False" };

        assert_eq!(
            claims.is_organizer, expected,
            "Unexpected organizer claim"
        );

        self
    }
}
