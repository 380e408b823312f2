use crate::errors::IssuerError;
use crate::handlers::auth_handler::AppState;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;

/// Authentication middleware for protected resources
///
/// Validates the bearer token in strict mode (signature and time window) and
/// stores the verified `DecodedToken` in request extensions for downstream
/// handlers. Any failure is a 401 with no detail about the cause.
pub async fn require_valid_token(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, IssuerError> {
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let decoded = state.auth_service.verify(authorization)?;

    req.extensions_mut().insert(decoded);

    Ok(next.run(req).await)
}
