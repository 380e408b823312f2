//! Observability for the token issuer.
//!
//! # Privacy by Default
//!
//! All token and crypto functions use `#[instrument(skip_all)]` and record
//! only allow-listed fields:
//! - **SAFE**: plaintext (flow, mode, rejection reason, error code)
//! - **HASHED**: SHA-256 correlation prefix (usernames)
//! - **NEVER**: passwords, tokens, key material

pub mod metrics;

use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars)
///
/// One-way and truncated: enough to follow a username across log lines
/// without storing it.
pub fn hash_for_correlation(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    hex::encode(result.get(..4).unwrap_or_default())
}
