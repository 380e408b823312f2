use crate::errors::IssuerError;
use crate::services::auth_service::AuthService;
use crate::tokens::DecodedToken;
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    Extension, Json,
};
use common::secret::SecretString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Login body. Field names are accepted in the casings existing clients send.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default, alias = "userName", alias = "UserName")]
    pub username: String,
    #[serde(default, alias = "Password")]
    pub password: Option<SecretString>,
}

/// One claim of a verified token as returned by the probe endpoint.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClaimEntry {
    #[serde(rename = "type")]
    pub claim_type: String,
    pub value: String,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
}

/// Handle a fresh login
///
/// POST /api/v1/auth
///
/// Responds with the signed token as a JSON string.
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<String>, IssuerError> {
    let password = payload
        .password
        .unwrap_or_else(|| SecretString::from(String::new()));

    let token = state
        .auth_service
        .login(&payload.username, &password)
        .await?;

    Ok(Json(token))
}

/// Handle token renewal from the `Authorization` header
///
/// GET /api/v1/auth
///
/// An expired token is accepted as long as its signature verifies.
pub async fn handle_refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<String>, IssuerError> {
    let authorization = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok());

    let token = state.auth_service.renew(authorization)?;

    Ok(Json(token))
}

/// Protected-resource probe
///
/// POST /api/v1/auth/test
///
/// Runs behind `require_valid_token` and echoes every verified claim,
/// registered ones included.
pub async fn handle_test(Extension(decoded): Extension<DecodedToken>) -> Json<Vec<ClaimEntry>> {
    let entries = decoded
        .to_pairs()
        .into_iter()
        .map(|(claim_type, value)| ClaimEntry {
            claim_type: claim_type.to_string(),
            value,
        })
        .collect();

    Json(entries)
}
