//! Error types for the token issuer.
//!
//! - [`TokenError`] is the decode-layer outcome of reading a token. It never
//!   reaches an HTTP caller directly.
//! - [`IssuerError`] is what services and handlers return; its
//!   [`IntoResponse`] impl renders a generic JSON error body.
//!
//! Status mapping:
//! - InvalidRequest: 400 Bad Request
//! - InvalidCredentials: 400 Bad Request
//! - Unauthenticated: 401 Unauthorized
//! - CredentialStore: 503 Service Unavailable
//! - Crypto: 500 Internal Server Error

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Message returned for every rejected or missing bearer token.
pub const UNAUTHENTICATED_MESSAGE: &str = "The access token is invalid or expired";

/// Failure reading a compact token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Not decodable as a token this issuer produces.
    #[error("Malformed token")]
    Malformed,

    /// Signature, algorithm or key id did not match.
    #[error("Bad token signature")]
    BadSignature,

    /// Outside the `[nbf, exp)` window. Only raised when expiration is enforced.
    #[error("Token expired")]
    Expired,
}

impl TokenError {
    /// Bounded label value for validation metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::BadSignature => "bad_signature",
            TokenError::Expired => "expired",
        }
    }
}

#[derive(Debug, Error)]
pub enum IssuerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Credential store error: {0}")]
    CredentialStore(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),
}

impl IssuerError {
    /// Bounded label value for logs and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            IssuerError::InvalidRequest(_) => "INVALID_REQUEST",
            IssuerError::InvalidCredentials => "INVALID_CREDENTIALS",
            IssuerError::Unauthenticated => "UNAUTHENTICATED",
            IssuerError::CredentialStore(_) => "SERVICE_UNAVAILABLE",
            IssuerError::Crypto(_) => "CRYPTO_ERROR",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for IssuerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            IssuerError::InvalidRequest(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
            IssuerError::InvalidCredentials => {
                (StatusCode::BAD_REQUEST, "Invalid credentials".to_string())
            }
            IssuerError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                UNAUTHENTICATED_MESSAGE.to_string(),
            ),
            IssuerError::CredentialStore(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Credential store is unavailable".to_string(),
            ),
            IssuerError::Crypto(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal cryptographic error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) =
                "Bearer realm=\"token-issuer\", error=\"invalid_token\"".parse()
            {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}
