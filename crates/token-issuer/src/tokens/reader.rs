//! Decoding and verification of presented tokens.
//!
//! Order of checks (first failure wins):
//! 1. structure: size, three base64url segments, JSON header -> `Malformed`
//! 2. header: algorithm and key id match the issuer key -> `BadSignature`
//! 3. signature -> `BadSignature`
//! 4. payload: JSON shape, issuer, audience, typed claims -> `Malformed`
//! 5. time window, only under [`ExpirationPolicy::Enforce`] -> `Expired`
//!
//! The signature is verified under both policies. Ignoring expiration never
//! relaxes anything else.

use crate::crypto::SigningAlgorithm;
use crate::errors::TokenError;
use crate::observability::metrics::record_token_validation;
use crate::tokens::claims::{parse_organization_id, parse_organizer, ClaimSet, WireClaims};
use crate::tokens::IssuerConfig;
use common::jwt::inspect_token;
use jsonwebtoken::{decode, errors::ErrorKind, Validation};
use tracing::instrument;

/// Whether the `[nbf, exp)` window is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirationPolicy {
    /// Protected-resource access.
    Enforce,
    /// Renewal of a previously issued token.
    Ignore,
}

impl ExpirationPolicy {
    /// Bounded label value for validation metrics.
    pub fn mode(&self) -> &'static str {
        match self {
            ExpirationPolicy::Enforce => "strict",
            ExpirationPolicy::Ignore => "renewal",
        }
    }
}

/// A verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    pub claims: ClaimSet,
    pub issuer: String,
    pub audience: String,
    /// `nbf`, seconds since the Unix epoch.
    pub not_before: i64,
    /// `exp`, seconds since the Unix epoch.
    pub expires_at: i64,
}

impl DecodedToken {
    /// Every claim of the token as `(type, value)` pairs in wire order.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("iss", self.issuer.clone()),
            ("aud", self.audience.clone()),
            ("nbf", self.not_before.to_string()),
            ("exp", self.expires_at.to_string()),
        ];
        pairs.extend(self.claims.to_pairs());
        pairs
    }
}

const REQUIRED_CLAIMS: [&str; 5] = ["exp", "nbf", "iss", "aud", "sub"];

/// Read a token issued with `config`'s key, identified by `key_id`.
pub fn read_token(
    config: &IssuerConfig,
    token: &str,
    key_id: &str,
    policy: ExpirationPolicy,
) -> Result<DecodedToken, TokenError> {
    read_token_at(
        config,
        token,
        key_id,
        policy,
        chrono::Utc::now().timestamp(),
    )
}

/// Deterministic [`read_token`] against an explicit `now` (Unix seconds).
#[instrument(skip_all, fields(mode = policy.mode()))]
pub fn read_token_at(
    config: &IssuerConfig,
    token: &str,
    key_id: &str,
    policy: ExpirationPolicy,
    now: i64,
) -> Result<DecodedToken, TokenError> {
    let result = verify(config, token, key_id, policy, now);

    match &result {
        Ok(_) => record_token_validation(policy.mode(), "success", "none"),
        Err(e) => {
            tracing::debug!(
                target: "token_issuer.tokens",
                mode = policy.mode(),
                reason = e.reason(),
                "Token rejected"
            );
            record_token_validation(policy.mode(), "error", e.reason());
        }
    }

    result
}

fn verify(
    config: &IssuerConfig,
    token: &str,
    key_id: &str,
    policy: ExpirationPolicy,
    now: i64,
) -> Result<DecodedToken, TokenError> {
    let header = inspect_token(token).map_err(|_| TokenError::Malformed)?;

    let key = config.signing_key();

    let algorithm = header
        .alg
        .as_deref()
        .and_then(|alg| alg.parse::<SigningAlgorithm>().ok())
        .ok_or(TokenError::BadSignature)?;

    if algorithm != key.algorithm() {
        tracing::debug!(
            target: "token_issuer.tokens",
            presented = %algorithm,
            expected = %key.algorithm(),
            "Token algorithm does not match issuer key"
        );
        return Err(TokenError::BadSignature);
    }

    if key_id != key.key_id() || header.kid.as_deref() != Some(key_id) {
        tracing::debug!(target: "token_issuer.tokens", "Token key id does not match issuer key");
        return Err(TokenError::BadSignature);
    }

    let mut validation = Validation::new(algorithm.jwt_algorithm());
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.leeway = 0;
    validation.set_issuer(&[config.issuer()]);
    validation.set_audience(&[config.audience()]);
    validation.set_required_spec_claims(&REQUIRED_CLAIMS);

    let token_data =
        decode::<WireClaims>(token, key.decoding_key(), &validation).map_err(|e| {
            tracing::debug!(target: "token_issuer.tokens", error = %e, "Token verification failed");
            match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::BadSignature
                }
                ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

    let wire = token_data.claims;

    if wire.sub.is_empty() {
        return Err(TokenError::Malformed);
    }

    let organization_id =
        parse_organization_id(&wire.organization_id).ok_or(TokenError::Malformed)?;
    let is_organizer = parse_organizer(&wire.is_organizer).ok_or(TokenError::Malformed)?;

    if policy == ExpirationPolicy::Enforce && (now >= wire.exp || now < wire.nbf) {
        return Err(TokenError::Expired);
    }

    Ok(DecodedToken {
        claims: ClaimSet {
            subject: wire.sub,
            token_id: wire.jti,
            issued_at: wire.iat,
            organization_id,
            is_organizer,
        },
        issuer: wire.iss,
        audience: wire.aud,
        not_before: wire.nbf,
        expires_at: wire.exp,
    })
}
