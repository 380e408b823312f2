//! Claim set construction and its wire encoding.
//!
//! Organization and organizer claims are carried as strings (`"7"`,
//! `"True"`) because tokens already in circulation use that form.

use crate::tokens::IssuerConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::instrument;

/// Wire name of the organization id claim.
pub const ORGANIZATION_CLAIM: &str = "IdOng";

/// Wire name of the organizer flag claim.
pub const ORGANIZER_CLAIM: &str = "Organizator";

/// Claims carried by every issued token.
#[derive(Clone, PartialEq, Eq)]
pub struct ClaimSet {
    /// Authenticated username (`sub`). Never empty.
    pub subject: String,
    /// Unique token id (`jti`).
    pub token_id: String,
    /// Issued-at, seconds since the Unix epoch (`iat`).
    pub issued_at: i64,
    /// Organization the user belongs to; 0 means none.
    pub organization_id: u32,
    pub is_organizer: bool,
}

/// `sub` and `jti` are redacted.
impl fmt::Debug for ClaimSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimSet")
            .field("subject", &"[REDACTED]")
            .field("token_id", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .field("organization_id", &self.organization_id)
            .field("is_organizer", &self.is_organizer)
            .finish()
    }
}

impl ClaimSet {
    /// Identity and role claims as `(type, value)` pairs in wire form and
    /// wire order. Registered time and audience claims are not included.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("sub", self.subject.clone()),
            ("jti", self.token_id.clone()),
            ("iat", self.issued_at.to_string()),
            (
                ORGANIZATION_CLAIM,
                encode_organization_id(self.organization_id),
            ),
            (ORGANIZER_CLAIM, encode_organizer(self.is_organizer).to_string()),
        ]
    }
}

/// Build the claim set for a fresh token issued now.
///
/// Draws exactly one id from the configured generator.
pub fn build_claims(
    config: &IssuerConfig,
    subject: &str,
    organization_id: u32,
    is_organizer: bool,
) -> ClaimSet {
    build_claims_at(
        config,
        subject,
        organization_id,
        is_organizer,
        chrono::Utc::now().timestamp(),
    )
}

/// Deterministic [`build_claims`] against an explicit issued-at instant.
#[instrument(skip_all)]
pub fn build_claims_at(
    config: &IssuerConfig,
    subject: &str,
    organization_id: u32,
    is_organizer: bool,
    issued_at: i64,
) -> ClaimSet {
    ClaimSet {
        subject: subject.to_string(),
        token_id: config.next_token_id(),
        issued_at,
        organization_id,
        is_organizer,
    }
}

/// Decimal text of an organization id.
pub fn encode_organization_id(organization_id: u32) -> String {
    organization_id.to_string()
}

/// Parse a decimal organization id. Negative or non-numeric text is `None`.
pub fn parse_organization_id(value: &str) -> Option<u32> {
    value.parse().ok()
}

/// Textual organizer flag as carried by existing tokens.
pub fn encode_organizer(is_organizer: bool) -> &'static str {
    if is_organizer {
        "True"
    } else {
        "False"
    }
}

/// Parse an organizer flag, ignoring ASCII case.
pub fn parse_organizer(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// JSON payload of an issued token.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WireClaims {
    pub iss: String,
    pub aud: String,
    pub nbf: i64,
    pub exp: i64,
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    #[serde(rename = "IdOng")]
    pub organization_id: String,
    #[serde(rename = "Organizator")]
    pub is_organizer: String,
}
