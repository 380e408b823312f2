//! Test server harness for E2E testing
//!
//! Provides TestIssuerServer for spawning real issuer instances in tests.

use crate::crypto_fixtures::test_issuer_config;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use token_issuer::handlers::auth_handler::AppState;
use token_issuer::routes;
use token_issuer::services::auth_service::AuthService;
use token_issuer::services::credential_store::mock::MockCredentialStore;
use token_issuer::tokens::{build_claims_at, sign_token, IssuerConfig};

/// Test harness for spawning the token issuer in E2E tests
///
/// Credentials come from a [`MockCredentialStore`]; signing uses the
/// deterministic key for seed 1.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_login_e2e() -> Result<()> {
///     let store = MockCredentialStore::new().with_user("alice", "pw", attrs);
///     let server = TestIssuerServer::spawn(store).await?;
///
///     let response = reqwest::Client::new()
///         .post(format!("{}/api/v1/auth", server.url()))
///         .json(&json!({"username": "alice", "password": "pw"}))
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestIssuerServer {
    addr: SocketAddr,
    auth_service: AuthService,
    store: Arc<MockCredentialStore>,
    _handle: JoinHandle<()>,
}

impl TestIssuerServer {
    /// Spawn a server with a one-hour validity window
    pub async fn spawn(store: MockCredentialStore) -> Result<Self, anyhow::Error> {
        Self::spawn_with_validity(store, 3600).await
    }

    /// Spawn a server on a random port (127.0.0.1:0)
    pub async fn spawn_with_validity(
        store: MockCredentialStore,
        valid_for_seconds: i64,
    ) -> Result<Self, anyhow::Error> {
        let config = test_issuer_config(1, valid_for_seconds)?;
        let store = Arc::new(store);

        let auth_service = AuthService::new(config, store.clone())
            .map_err(|e| anyhow::anyhow!("Failed to create auth service: {}", e))?;

        let state = Arc::new(AppState {
            auth_service: auth_service.clone(),
        });

        // The global recorder can only be installed once per test process;
        // later servers get a standalone recorder.
        let metrics_handle = match routes::init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => {
                use metrics_exporter_prometheus::PrometheusBuilder;
                let recorder = PrometheusBuilder::new().build_recorder();
                recorder.handle()
            }
        };

        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            auth_service,
            store,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Issuer configuration the server signs with
    pub fn config(&self) -> &IssuerConfig {
        self.auth_service.config()
    }

    /// Credential store backing the server (for call counts)
    pub fn store(&self) -> &MockCredentialStore {
        &self.store
    }

    /// Sign a token with the server's own key as if issued at `issued_at`
    ///
    /// Useful for back-dated and already-expired tokens.
    pub fn issue_token_at(
        &self,
        subject: &str,
        organization_id: u32,
        is_organizer: bool,
        issued_at: i64,
    ) -> Result<String, anyhow::Error> {
        let claims = build_claims_at(
            self.config(),
            subject,
            organization_id,
            is_organizer,
            issued_at,
        );
        Ok(sign_token(self.config(), &claims)?)
    }
}

impl Drop for TestIssuerServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
