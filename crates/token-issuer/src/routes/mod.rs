//! HTTP routes for the token issuer.

use crate::handlers::auth_handler::{self, AppState};
use crate::handlers::metrics::metrics_handler;
use crate::middleware::auth::require_valid_token;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub use crate::observability::metrics::init_metrics_recorder;

/// Build the application routes.
///
/// - `POST /api/v1/auth` - login
/// - `GET /api/v1/auth` - renewal
/// - `POST /api/v1/auth/test` - protected probe (strict token validation)
/// - `/health`, `/metrics` - operational, unversioned
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let public_routes = Router::new()
        .route(
            "/api/v1/auth",
            post(auth_handler::handle_login).get(auth_handler::handle_refresh),
        )
        .route("/health", get(health_check))
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    let protected_routes = Router::new()
        .route("/api/v1/auth/test", post(auth_handler::handle_test))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_valid_token,
        ))
        .with_state(state);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[tokio::test]
    async fn test_health_check() {
        assert_eq!(health_check().await, "OK");
    }
}
