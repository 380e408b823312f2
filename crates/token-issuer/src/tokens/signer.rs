use crate::errors::IssuerError;
use crate::tokens::claims::{encode_organization_id, encode_organizer, ClaimSet, WireClaims};
use crate::tokens::IssuerConfig;
use jsonwebtoken::{encode, Header};
use tracing::instrument;

/// Sign a claim set into a compact JWT.
///
/// The claim set's issued-at instant is the reference for the time window:
/// `nbf = iat + not-before offset`, `exp = iat + validity`.
///
/// The header carries the configured algorithm, `typ: JWT` and the key id.
/// Given the same claims and configuration the output is identical.
#[instrument(skip_all)]
pub fn sign_token(config: &IssuerConfig, claims: &ClaimSet) -> Result<String, IssuerError> {
    let key = config.signing_key();

    let not_before = claims
        .issued_at
        .checked_add(config.not_before().offset_seconds())
        .ok_or_else(|| IssuerError::Crypto("Not-before instant out of range".to_string()))?;
    let expires_at = claims
        .issued_at
        .checked_add(config.valid_for_seconds())
        .ok_or_else(|| IssuerError::Crypto("Expiration instant out of range".to_string()))?;

    let wire = WireClaims {
        iss: config.issuer().to_string(),
        aud: config.audience().to_string(),
        nbf: not_before,
        exp: expires_at,
        sub: claims.subject.clone(),
        jti: claims.token_id.clone(),
        iat: claims.issued_at,
        organization_id: encode_organization_id(claims.organization_id),
        is_organizer: encode_organizer(claims.is_organizer).to_string(),
    };

    let mut header = Header::new(key.algorithm().jwt_algorithm());
    header.typ = Some("JWT".to_string());
    header.kid = Some(key.key_id().to_string());

    let token = encode(&header, &wire, key.encoding_key())
        .map_err(|e| IssuerError::Crypto(format!("JWT signing operation failed: {}", e)))?;

    Ok(token)
}
