//! Immutable issuer configuration and its validating builder.

use crate::config::{ConfigError, DEFAULT_VALID_FOR_SECONDS};
use crate::crypto::SigningKey;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Source of unique token identifiers (`jti`).
///
/// Implementations are shared across concurrent requests and must return a
/// value never returned before on every call. Ordering is not required.
pub trait JtiGenerator: Send + Sync {
    fn generate(&self) -> String;
}

impl<F> JtiGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn generate(&self) -> String {
        self()
    }
}

/// Random v4 UUIDs (122 bits of entropy).
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidJtiGenerator;

impl JtiGenerator for UuidJtiGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// How `nbf` is derived from the issued-at instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotBeforePolicy {
    /// `nbf = iat`.
    #[default]
    AtIssuance,
    /// `nbf = iat + offset` (seconds, may be negative).
    Offset(i64),
}

impl NotBeforePolicy {
    pub fn offset_seconds(&self) -> i64 {
        match self {
            NotBeforePolicy::AtIssuance => 0,
            NotBeforePolicy::Offset(seconds) => *seconds,
        }
    }
}

/// Process-wide token issuance settings.
///
/// Only constructible through [`IssuerConfigBuilder::build`], so every
/// instance has a positive validity window, a signing key and an id generator.
#[derive(Clone)]
pub struct IssuerConfig {
    signing_key: SigningKey,
    issuer: String,
    audience: String,
    valid_for_seconds: i64,
    not_before: NotBeforePolicy,
    jti_generator: Arc<dyn JtiGenerator>,
}

impl IssuerConfig {
    pub fn builder(issuer: impl Into<String>, audience: impl Into<String>) -> IssuerConfigBuilder {
        IssuerConfigBuilder {
            issuer: issuer.into(),
            audience: audience.into(),
            valid_for_seconds: DEFAULT_VALID_FOR_SECONDS,
            not_before: NotBeforePolicy::AtIssuance,
            signing_key: None,
            jti_generator: None,
        }
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn valid_for_seconds(&self) -> i64 {
        self.valid_for_seconds
    }

    pub fn not_before(&self) -> NotBeforePolicy {
        self.not_before
    }

    /// Draw the next token id from the configured generator.
    pub fn next_token_id(&self) -> String {
        self.jti_generator.generate()
    }
}

impl fmt::Debug for IssuerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuerConfig")
            .field("signing_key", &self.signing_key)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("valid_for_seconds", &self.valid_for_seconds)
            .field("not_before", &self.not_before)
            .finish_non_exhaustive()
    }
}

pub struct IssuerConfigBuilder {
    issuer: String,
    audience: String,
    valid_for_seconds: i64,
    not_before: NotBeforePolicy,
    signing_key: Option<SigningKey>,
    jti_generator: Option<Arc<dyn JtiGenerator>>,
}

impl IssuerConfigBuilder {
    pub fn valid_for_seconds(mut self, seconds: i64) -> Self {
        self.valid_for_seconds = seconds;
        self
    }

    pub fn not_before(mut self, policy: NotBeforePolicy) -> Self {
        self.not_before = policy;
        self
    }

    pub fn signing_key(mut self, key: SigningKey) -> Self {
        self.signing_key = Some(key);
        self
    }

    pub fn jti_generator(mut self, generator: impl JtiGenerator + 'static) -> Self {
        self.jti_generator = Some(Arc::new(generator));
        self
    }

    /// Share an existing generator (e.g. one a test keeps a handle to).
    pub fn shared_jti_generator(mut self, generator: Arc<dyn JtiGenerator>) -> Self {
        self.jti_generator = Some(generator);
        self
    }

    /// Validate and freeze the configuration.
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// validity window, signing key, id generator.
    pub fn build(self) -> Result<IssuerConfig, ConfigError> {
        if self.valid_for_seconds <= 0 {
            return Err(ConfigError::NonPositiveValidity(self.valid_for_seconds));
        }

        let signing_key = self.signing_key.ok_or(ConfigError::MissingSigningKey)?;
        let jti_generator = self.jti_generator.ok_or(ConfigError::MissingJtiGenerator)?;

        Ok(IssuerConfig {
            signing_key,
            issuer: self.issuer,
            audience: self.audience,
            valid_for_seconds: self.valid_for_seconds,
            not_before: self.not_before,
            jti_generator,
        })
    }
}
