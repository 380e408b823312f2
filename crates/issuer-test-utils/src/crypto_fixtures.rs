//! Deterministic cryptographic fixtures for testing
//!
//! Provides reproducible Ed25519 keys and issuer configurations.
//! All fixtures are deterministic based on seed values.

use ring::signature::{Ed25519KeyPair, KeyPair};
use thiserror::Error;
use token_issuer::crypto::SigningKey;
use token_issuer::tokens::{IssuerConfig, UuidJtiGenerator};

/// `iss` used by test configurations.
pub const TEST_ISSUER: &str = "https://issuer.test";

/// `aud` used by test configurations.
pub const TEST_AUDIENCE: &str = "meetings";

/// Key id used by test configurations.
pub const TEST_KEY_ID: &str = "issuer-key-01";

/// Test fixture error type
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),
}

/// Generate a deterministic Ed25519 private key (PKCS#8 DER) for testing.
///
/// The same seed always produces the same key, ensuring test reproducibility.
///
/// # Example
/// ```rust,ignore
/// let pkcs8 = test_signing_key(1)?;
/// assert_eq!(pkcs8, test_signing_key(1)?);
/// ```
pub fn test_signing_key(seed: u8) -> Result<Vec<u8>, FixtureError> {
    let pkcs8 = build_pkcs8_from_seed(&seed_bytes(seed));

    Ed25519KeyPair::from_pkcs8_maybe_unchecked(&pkcs8)
        .map_err(|e| FixtureError::Crypto(format!("Failed to load test keypair: {:?}", e)))?;

    Ok(pkcs8)
}

/// Raw Ed25519 public key for the given seed.
pub fn test_public_key(seed: u8) -> Result<Vec<u8>, FixtureError> {
    let key_pair = Ed25519KeyPair::from_seed_unchecked(&seed_bytes(seed))
        .map_err(|e| FixtureError::Crypto(format!("Failed to generate test keypair: {:?}", e)))?;

    Ok(key_pair.public_key().as_ref().to_vec())
}

/// Issuer configuration signing with the seeded key under [`TEST_KEY_ID`].
pub fn test_issuer_config(seed: u8, valid_for_seconds: i64) -> Result<IssuerConfig, FixtureError> {
    let key = SigningKey::ed25519_from_pkcs8(TEST_KEY_ID, &test_signing_key(seed)?)
        .map_err(|e| FixtureError::Crypto(e.to_string()))?;

    IssuerConfig::builder(TEST_ISSUER, TEST_AUDIENCE)
        .valid_for_seconds(valid_for_seconds)
        .signing_key(key)
        .jti_generator(UuidJtiGenerator)
        .build()
        .map_err(|e| FixtureError::Crypto(e.to_string()))
}

/// Fixed 32-byte HMAC secret for HS256 tests.
pub fn test_hmac_secret() -> Vec<u8> {
    (0u8..32).collect()
}

fn seed_bytes(seed: u8) -> [u8; 32] {
    let mut seed_bytes = [0u8; 32];
    seed_bytes[0] = seed;
    for (i, byte) in seed_bytes.iter_mut().enumerate().skip(1) {
        *byte = seed.wrapping_mul(i as u8).wrapping_add(i as u8);
    }
    seed_bytes
}

/// Build PKCS#8 v1 document from Ed25519 seed
///
/// Test-only. Production keys come from `generate_ed25519_pkcs8`.
fn build_pkcs8_from_seed(seed: &[u8; 32]) -> Vec<u8> {
    // SEQUENCE { version INTEGER 0, AlgorithmIdentifier { OID 1.3.101.112 },
    //            privateKey OCTET STRING { OCTET STRING seed } }
    let mut pkcs8 = vec![
        0x30, 0x2e, // SEQUENCE, 46 bytes
        0x02, 0x01, 0x00, // version 0
        0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, // Ed25519 OID
        0x04, 0x22, 0x04, 0x20, // OCTET STRING { OCTET STRING (32) }
    ];
    pkcs8.extend_from_slice(seed);
    pkcs8
}
