//! Signing keys and password hashing.
//!
//! A [`SigningKey`] pairs the `jsonwebtoken` encoding key with the decoding
//! key for the same material, so the issuer can verify what it signed without
//! a key lookup. Two algorithms are supported:
//!
//! - `EdDSA` (Ed25519) from a PKCS#8 private key document
//! - `HS256` from a shared secret of at least [`MIN_HMAC_SECRET_BYTES`]
//!
//! Key material never appears in `Debug` output.

use crate::errors::IssuerError;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use ring::{
    rand::SystemRandom,
    signature::{Ed25519KeyPair, KeyPair},
};
use std::fmt;
use std::str::FromStr;
use tracing::instrument;

/// Minimum HS256 secret length (RFC 7518 section 3.2: key size >= hash output).
pub const MIN_HMAC_SECRET_BYTES: usize = 32;

/// Bcrypt cost used when provisioning users.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Accepted bcrypt cost range.
pub const MIN_BCRYPT_COST: u32 = 10;
pub const MAX_BCRYPT_COST: u32 = 14;

/// Signing algorithm of the issuer key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    /// Ed25519 signatures (`alg: EdDSA`).
    EdDsa,
    /// HMAC-SHA256 (`alg: HS256`).
    Hs256,
}

impl SigningAlgorithm {
    /// Header value for this algorithm.
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningAlgorithm::EdDsa => "EdDSA",
            SigningAlgorithm::Hs256 => "HS256",
        }
    }

    pub(crate) fn jwt_algorithm(self) -> Algorithm {
        match self {
            SigningAlgorithm::EdDsa => Algorithm::EdDSA,
            SigningAlgorithm::Hs256 => Algorithm::HS256,
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = IssuerError;

    /// Parses `EdDSA` or `HS256`. The JOSE names are case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EdDSA" => Ok(SigningAlgorithm::EdDsa),
            "HS256" => Ok(SigningAlgorithm::Hs256),
            other => Err(IssuerError::Crypto(format!(
                "Unsupported signing algorithm: {other}"
            ))),
        }
    }
}

/// Key material used to sign issued tokens and verify presented ones.
#[derive(Clone)]
pub struct SigningKey {
    key_id: String,
    algorithm: SigningAlgorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    /// Build an Ed25519 key from a PKCS#8 document (v1 or v2).
    ///
    /// The document is parsed with `ring` so that malformed material fails
    /// here rather than on the first signature.
    #[instrument(skip_all)]
    pub fn ed25519_from_pkcs8(
        key_id: impl Into<String>,
        private_key_pkcs8: &[u8],
    ) -> Result<Self, IssuerError> {
        let key_pair = Ed25519KeyPair::from_pkcs8_maybe_unchecked(private_key_pkcs8)
            .map_err(|e| IssuerError::Crypto(format!("Invalid private key format: {}", e)))?;

        Ok(Self {
            key_id: key_id.into(),
            algorithm: SigningAlgorithm::EdDsa,
            encoding: EncodingKey::from_ed_der(private_key_pkcs8),
            decoding: DecodingKey::from_ed_der(key_pair.public_key().as_ref()),
        })
    }

    /// Build an HS256 key from a shared secret.
    #[instrument(skip_all)]
    pub fn hmac(key_id: impl Into<String>, secret: &[u8]) -> Result<Self, IssuerError> {
        if secret.len() < MIN_HMAC_SECRET_BYTES {
            return Err(IssuerError::Crypto(format!(
                "HMAC secret too short: {} bytes (minimum {})",
                secret.len(),
                MIN_HMAC_SECRET_BYTES
            )));
        }

        Ok(Self {
            key_id: key_id.into(),
            algorithm: SigningAlgorithm::Hs256,
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        })
    }

    /// Build a key for `algorithm` from raw key material.
    pub fn from_material(
        key_id: impl Into<String>,
        algorithm: SigningAlgorithm,
        material: &[u8],
    ) -> Result<Self, IssuerError> {
        match algorithm {
            SigningAlgorithm::EdDsa => Self::ed25519_from_pkcs8(key_id, material),
            SigningAlgorithm::Hs256 => Self::hmac(key_id, material),
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .field("encoding", &"[REDACTED]")
            .field("decoding", &"[REDACTED]")
            .finish()
    }
}

/// Generate a fresh Ed25519 private key as a PKCS#8 v2 document using the
/// system CSPRNG.
#[instrument(skip_all)]
pub fn generate_ed25519_pkcs8() -> Result<Vec<u8>, IssuerError> {
    let rng = SystemRandom::new();

    let pkcs8_bytes = Ed25519KeyPair::generate_pkcs8(&rng)
        .map_err(|e| IssuerError::Crypto(format!("Keypair generation failed: {}", e)))?;

    Ok(pkcs8_bytes.as_ref().to_vec())
}

/// Hash a password with bcrypt.
///
/// # Errors
///
/// Returns `IssuerError::Crypto` if `cost` is outside
/// `MIN_BCRYPT_COST..=MAX_BCRYPT_COST` or hashing fails.
#[instrument(skip_all)]
pub fn hash_password(password: &str, cost: u32) -> Result<String, IssuerError> {
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
        return Err(IssuerError::Crypto(format!(
            "Invalid bcrypt cost: {} (must be {}-{})",
            cost, MIN_BCRYPT_COST, MAX_BCRYPT_COST
        )));
    }

    bcrypt::hash(password, cost)
        .map_err(|e| IssuerError::Crypto(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a bcrypt hash.
#[instrument(skip_all)]
pub fn verify_password(password: &str, hash: &str) -> Result<bool, IssuerError> {
    bcrypt::verify(password, hash)
        .map_err(|e| IssuerError::Crypto(format!("Password verification failed: {}", e)))
}
