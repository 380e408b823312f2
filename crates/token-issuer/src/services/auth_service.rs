//! Login and renewal flows.
//!
//! Login delegates to the [`CredentialStore`] and issues a fresh token.
//! Renewal trusts the signature of a previously issued token, even an
//! expired one, and re-issues with the same subject and attributes; the
//! credential store is not consulted.

use crate::config::ConfigError;
use crate::errors::IssuerError;
use crate::observability::hash_for_correlation;
use crate::observability::metrics::{record_credential_lookup, record_token_issuance};
use crate::services::credential_store::CredentialStore;
use crate::tokens::{
    build_claims_at, read_token_at, sign_token, ClaimSet, DecodedToken, ExpirationPolicy,
    IssuerConfig,
};
use common::jwt::extract_bearer_token;
use common::secret::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

const FLOW_LOGIN: &str = "login";
const FLOW_RENEWAL: &str = "renewal";

/// Token issuance orchestrator shared by all request handlers.
#[derive(Clone)]
pub struct AuthService {
    config: Arc<IssuerConfig>,
    credentials: Arc<dyn CredentialStore>,
}

impl AuthService {
    /// Create the service and prove the signing key works.
    ///
    /// Signs a probe token and reads it back with the configured key. The
    /// probe does not draw from the token id generator.
    pub fn new(
        config: IssuerConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ConfigError> {
        let probe = ClaimSet {
            subject: "startup-probe".to_string(),
            token_id: "startup-probe".to_string(),
            issued_at: chrono::Utc::now().timestamp(),
            organization_id: 0,
            is_organizer: false,
        };

        let token =
            sign_token(&config, &probe).map_err(|e| ConfigError::ProbeFailed(e.to_string()))?;

        let decoded = read_token_at(
            &config,
            &token,
            config.signing_key().key_id(),
            ExpirationPolicy::Ignore,
            probe.issued_at,
        )
        .map_err(|e| ConfigError::ProbeFailed(e.to_string()))?;

        if decoded.claims != probe {
            return Err(ConfigError::ProbeFailed(
                "Probe claims did not survive a round trip".to_string(),
            ));
        }

        Ok(Self {
            config: Arc::new(config),
            credentials,
        })
    }

    pub fn config(&self) -> &IssuerConfig {
        &self.config
    }

    /// Fresh login with a username and password.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` - empty username or password (store not contacted)
    /// - `InvalidCredentials` - unknown user or wrong password
    /// - `CredentialStore` - the store itself failed; not retried
    /// - `Crypto` - signing failed
    #[instrument(skip_all)]
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<String, IssuerError> {
        let start = Instant::now();
        let result = self.login_inner(username, password).await;
        record_outcome(FLOW_LOGIN, &result, start);
        result
    }

    async fn login_inner(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<String, IssuerError> {
        if username.trim().is_empty() {
            return Err(IssuerError::InvalidRequest(
                "username is required".to_string(),
            ));
        }
        if password.expose_secret().is_empty() {
            return Err(IssuerError::InvalidRequest(
                "password is required".to_string(),
            ));
        }

        let user_hash = hash_for_correlation(username);

        let attributes = match self.credentials.authenticate(username, password).await {
            Ok(Some(attributes)) => {
                record_credential_lookup("match");
                attributes
            }
            Ok(None) => {
                record_credential_lookup("no_match");
                tracing::info!(user = %user_hash, "Login rejected: invalid credentials");
                return Err(IssuerError::InvalidCredentials);
            }
            Err(e) => {
                record_credential_lookup("error");
                tracing::error!(user = %user_hash, error = %e, "Credential store lookup failed");
                return Err(e);
            }
        };

        let claims = build_claims_at(
            &self.config,
            username,
            attributes.organization_id,
            attributes.is_organizer,
            chrono::Utc::now().timestamp(),
        );
        let token = sign_token(&self.config, &claims)?;

        tracing::debug!(user = %user_hash, "Token issued for login");
        Ok(token)
    }

    /// Renew from the raw `Authorization` header value.
    pub fn renew(&self, authorization: Option<&str>) -> Result<String, IssuerError> {
        self.renew_at(authorization, chrono::Utc::now().timestamp())
    }

    /// Deterministic [`renew`](Self::renew): the new token is issued at `now`.
    ///
    /// Missing or blank headers are rejected without decoding. Every decode
    /// failure collapses into `Unauthenticated`.
    #[instrument(skip_all)]
    pub fn renew_at(&self, authorization: Option<&str>, now: i64) -> Result<String, IssuerError> {
        let start = Instant::now();
        let result = self.renew_inner(authorization, now);
        record_outcome(FLOW_RENEWAL, &result, start);
        result
    }

    fn renew_inner(&self, authorization: Option<&str>, now: i64) -> Result<String, IssuerError> {
        let token = authorization
            .and_then(extract_bearer_token)
            .ok_or(IssuerError::Unauthenticated)?;

        let decoded = read_token_at(
            &self.config,
            token,
            self.config.signing_key().key_id(),
            ExpirationPolicy::Ignore,
            now,
        )
        .map_err(|_| IssuerError::Unauthenticated)?;

        let previous = decoded.claims;
        let claims = build_claims_at(
            &self.config,
            &previous.subject,
            previous.organization_id,
            previous.is_organizer,
            now,
        );
        let token = sign_token(&self.config, &claims)?;

        tracing::debug!(
            user = %hash_for_correlation(&previous.subject),
            "Token renewed"
        );
        Ok(token)
    }

    /// Strict validation of a bearer token for protected resources.
    pub fn verify(&self, authorization: Option<&str>) -> Result<DecodedToken, IssuerError> {
        self.verify_at(authorization, chrono::Utc::now().timestamp())
    }

    /// Deterministic [`verify`](Self::verify) against an explicit `now`.
    #[instrument(skip_all)]
    pub fn verify_at(
        &self,
        authorization: Option<&str>,
        now: i64,
    ) -> Result<DecodedToken, IssuerError> {
        let token = authorization
            .and_then(extract_bearer_token)
            .ok_or(IssuerError::Unauthenticated)?;

        read_token_at(
            &self.config,
            token,
            self.config.signing_key().key_id(),
            ExpirationPolicy::Enforce,
            now,
        )
        .map_err(|_| IssuerError::Unauthenticated)
    }
}

fn record_outcome(flow: &str, result: &Result<String, IssuerError>, start: Instant) {
    let status = match result {
        Ok(_) => "success",
        Err(e) => {
            tracing::debug!(flow, code = e.code(), "Token issuance failed");
            "error"
        }
    };
    record_token_issuance(flow, status, start.elapsed());
}
