//! Builder patterns for test tokens
//!
//! Produces tokens the issuer itself would never sign: back-dated, forged
//! with a foreign key, carrying a wrong `kid`, or with non-numeric claim
//! values. Every claim is a raw JSON value so tests can break any of them.

use crate::crypto_fixtures::{test_signing_key, FixtureError, TEST_AUDIENCE, TEST_ISSUER, TEST_KEY_ID};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};

/// Builder for signed test JWTs
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_user("alice")
///     .with_organization(7)
///     .issued_at(now - 7200)
///     .sign(1)?;
/// ```
pub struct TestTokenBuilder {
    claims: Map<String, Value>,
    key_id: Option<String>,
}

impl TestTokenBuilder {
    /// Create a builder for a token issued now, valid for an hour
    pub fn new() -> Self {
        let now = Utc::now().timestamp();
        let mut builder = Self {
            claims: Map::new(),
            key_id: Some(TEST_KEY_ID.to_string()),
        };
        builder
            .set("iss", json!(TEST_ISSUER))
            .set("aud", json!(TEST_AUDIENCE))
            .set("sub", json!("test-subject"))
            .set("jti", json!("test-token-id"))
            .set("IdOng", json!("0"))
            .set("Organizator", json!("False"));
        builder.issued_at(now)
    }

    fn set(&mut self, name: &str, value: Value) -> &mut Self {
        self.claims.insert(name.to_string(), value);
        self
    }

    /// Set the subject
    pub fn for_user(mut self, subject: &str) -> Self {
        self.set("sub", json!(subject));
        self
    }

    /// Set the token id
    pub fn with_token_id(mut self, token_id: &str) -> Self {
        self.set("jti", json!(token_id));
        self
    }

    /// Set `iat` and `nbf` to `timestamp` and `exp` to an hour later
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.set("iat", json!(timestamp))
            .set("nbf", json!(timestamp))
            .set("exp", json!(timestamp + 3600));
        self
    }

    /// Override `exp`
    pub fn expires_at(mut self, timestamp: i64) -> Self {
        self.set("exp", json!(timestamp));
        self
    }

    /// Override `nbf`
    pub fn not_before(mut self, timestamp: i64) -> Self {
        self.set("nbf", json!(timestamp));
        self
    }

    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.set("iss", json!(issuer));
        self
    }

    pub fn with_audience(mut self, audience: &str) -> Self {
        self.set("aud", json!(audience));
        self
    }

    /// Set the organization claim in its decimal wire form
    pub fn with_organization(mut self, organization_id: u32) -> Self {
        self.set("IdOng", json!(organization_id.to_string()));
        self
    }

    /// Set the organizer claim in its `True`/`False` wire form
    pub fn organizer(mut self, is_organizer: bool) -> Self {
        let value = if is_organizer { "True" } else { "False" };
        self.set("Organizator", json!(value));
        self
    }

    /// Set any claim to an arbitrary JSON value
    pub fn with_raw_claim(mut self, name: &str, value: Value) -> Self {
        self.set(name, value);
        self
    }

    /// Remove a claim entirely
    pub fn without_claim(mut self, name: &str) -> Self {
        self.claims.remove(name);
        self
    }

    /// Set the `kid` header
    pub fn with_key_id(mut self, key_id: &str) -> Self {
        self.key_id = Some(key_id.to_string());
        self
    }

    /// Omit the `kid` header
    pub fn without_key_id(mut self) -> Self {
        self.key_id = None;
        self
    }

    /// Claims as a JSON object
    pub fn build(&self) -> Value {
        Value::Object(self.claims.clone())
    }

    /// Sign with the deterministic Ed25519 key for `seed`
    pub fn sign(self, seed: u8) -> Result<String, FixtureError> {
        let key = EncodingKey::from_ed_der(&test_signing_key(seed)?);
        self.sign_with(Algorithm::EdDSA, &key)
    }

    /// Sign with an HMAC secret (HS256)
    pub fn sign_hmac(self, secret: &[u8]) -> Result<String, FixtureError> {
        self.sign_with(Algorithm::HS256, &EncodingKey::from_secret(secret))
    }

    fn sign_with(self, algorithm: Algorithm, key: &EncodingKey) -> Result<String, FixtureError> {
        let mut header = Header::new(algorithm);
        header.typ = Some("JWT".to_string());
        header.kid = self.key_id.clone();

        encode(&header, &self.build(), key)
            .map_err(|e| FixtureError::Crypto(format!("Failed to sign test token: {}", e)))
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
