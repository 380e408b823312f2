//! JWT helpers shared by the issuer and by services that consume its tokens.
//!
//! - Size limit applied before any parsing
//! - Structural inspection of compact tokens (segments, base64url, header JSON)
//! - `Authorization` header bearer extraction
//!
//! None of these functions verify a signature. A token that passes
//! [`inspect_token`] must still be verified with the issuer's key before any
//! claim in it is trusted.
//!
//! ```rust,ignore
//! use common::jwt::{extract_bearer_token, inspect_token};
//!
//! let token = extract_bearer_token(header_value).ok_or(Unauthenticated)?;
//! let header = inspect_token(token)?;
//! if header.kid.as_deref() != Some(expected_kid) {
//!     return Err(BadSignature);
//! }
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Tokens issued here are around 400 bytes. Anything larger than this is
/// rejected before base64 decoding or signature verification.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Authorization scheme accepted in front of a compact token.
const BEARER_SCHEME: &str = "bearer";

// =============================================================================
// Error Types
// =============================================================================

/// Errors from structural token inspection.
///
/// Messages are deliberately identical so that callers surfacing them cannot
/// leak which check failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds [`MAX_JWT_SIZE_BYTES`].
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token is not a compact JWT (segment count, base64url or header JSON).
    #[error("The access token is invalid or expired")]
    MalformedToken,
}

// =============================================================================
// Header
// =============================================================================

/// The JOSE header fields needed to choose a verification key.
///
/// Values are taken verbatim from the unverified header; `alg` is kept as a
/// string so that unknown or `none` algorithms can be rejected by the caller
/// instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenHeader {
    /// `alg` header parameter, when present as a string.
    pub alg: Option<String>,

    /// `kid` header parameter, when present as a non-empty string.
    pub kid: Option<String>,

    /// `typ` header parameter, when present as a string.
    pub typ: Option<String>,
}

// =============================================================================
// Functions
// =============================================================================

/// Check the compact structure of a token and return its unverified header.
///
/// Performs, in order:
/// 1. size check against [`MAX_JWT_SIZE_BYTES`]
/// 2. exactly three dot-separated, non-empty segments
/// 3. every segment decodes as unpadded base64url
/// 4. the header segment is a JSON object
///
/// The payload is only required to be valid base64url here. Its JSON shape is
/// checked after signature verification so that a modified payload is reported
/// as a signature failure rather than a structural one.
///
/// # Errors
///
/// - `TokenTooLarge` - token exceeds the size limit
/// - `MalformedToken` - any structural check failed
pub fn inspect_token(token: &str) -> Result<TokenHeader, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        tracing::debug!(
            target: "common.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(JwtValidationError::MalformedToken);
    }

    let mut decoded = Vec::with_capacity(parts.len());
    for part in &parts {
        let bytes = URL_SAFE_NO_PAD.decode(part).map_err(|e| {
            tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT segment base64");
            JwtValidationError::MalformedToken
        })?;
        decoded.push(bytes);
    }

    let header_bytes = decoded.first().ok_or(JwtValidationError::MalformedToken)?;
    let header: serde_json::Value = serde_json::from_slice(header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    let Some(fields) = header.as_object() else {
        tracing::debug!(target: "common.jwt", "Token rejected: header is not a JSON object");
        return Err(JwtValidationError::MalformedToken);
    };

    let string_field = |name: &str| {
        fields
            .get(name)
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string)
    };

    Ok(TokenHeader {
        alg: string_field("alg"),
        kid: string_field("kid").filter(|kid| !kid.is_empty()),
        typ: string_field("typ"),
    })
}

/// Extract the compact token from an `Authorization` header value.
///
/// Surrounding whitespace is trimmed, an optional case-insensitive `Bearer`
/// scheme is stripped, and whatever follows is trimmed again. Returns `None`
/// when nothing is left.
///
/// ```rust
/// use common::jwt::extract_bearer_token;
///
/// assert_eq!(extract_bearer_token("  Bearer   abc.def.ghi "), Some("abc.def.ghi"));
/// assert_eq!(extract_bearer_token("abc.def.ghi"), Some("abc.def.ghi"));
/// assert_eq!(extract_bearer_token("bearer "), None);
/// ```
#[must_use]
pub fn extract_bearer_token(header_value: &str) -> Option<&str> {
    let trimmed = header_value.trim();

    let token = match (
        trimmed.get(..BEARER_SCHEME.len()),
        trimmed.get(BEARER_SCHEME.len()..),
    ) {
        (Some(scheme), Some(rest))
            if scheme.eq_ignore_ascii_case(BEARER_SCHEME)
                && (rest.is_empty() || rest.starts_with(char::is_whitespace)) =>
        {
            rest.trim()
        }
        _ => trimmed,
    };

    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

// =============================================================================
// Tests
// =============================================================================
