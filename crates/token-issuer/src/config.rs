use crate::crypto::{SigningAlgorithm, SigningKey};
use crate::tokens::{IssuerConfig, NotBeforePolicy, UuidJtiGenerator};
use base64::{engine::general_purpose, Engine as _};
use common::secret::{ExposeSecret, SecretBox};
use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Default HTTP listen address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8083";

/// Default token validity window (1 hour).
pub const DEFAULT_VALID_FOR_SECONDS: i64 = 3600;

/// Default `kid` header value.
pub const DEFAULT_SIGNING_KEY_ID: &str = "issuer-key-01";

#[derive(Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub issuer: String,
    pub audience: String,
    pub valid_for_seconds: i64,
    pub not_before_offset_seconds: i64,
    pub signing_algorithm: SigningAlgorithm,
    /// Decoded key material: PKCS#8 for `EdDSA`, raw secret for `HS256`.
    pub signing_key: SecretBox<Vec<u8>>,
    pub signing_key_id: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("Token validity duration must be positive, got {0} seconds")]
    NonPositiveValidity(i64),

    #[error("Signing credentials are missing")]
    MissingSigningKey,

    #[error("Token id generator is missing")]
    MissingJtiGenerator,

    #[error("Invalid signing key: {0}")]
    InvalidSigningKey(String),

    #[error("Startup token probe failed: {0}")]
    ProbeFailed(String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = required(vars, "DATABASE_URL")?;

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let issuer = required(vars, "JWT_ISSUER")?;
        let audience = required(vars, "JWT_AUDIENCE")?;

        let valid_for_seconds =
            parse_seconds(vars, "JWT_VALID_FOR_SECONDS", DEFAULT_VALID_FOR_SECONDS)?;
        let not_before_offset_seconds = parse_seconds(vars, "JWT_NOT_BEFORE_OFFSET_SECONDS", 0)?;

        let signing_algorithm = match vars.get("JWT_SIGNING_ALGORITHM") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                name: "JWT_SIGNING_ALGORITHM".to_string(),
                reason: format!("expected EdDSA or HS256, got '{value}'"),
            })?,
            None => SigningAlgorithm::EdDsa,
        };

        let signing_key_base64 = required(vars, "JWT_SIGNING_KEY")?;
        let signing_key = general_purpose::STANDARD
            .decode(signing_key_base64.trim())
            .map_err(ConfigError::Base64Error)?;

        let signing_key_id = vars
            .get("JWT_SIGNING_KEY_ID")
            .cloned()
            .unwrap_or_else(|| DEFAULT_SIGNING_KEY_ID.to_string());

        Ok(Config {
            database_url,
            bind_address,
            issuer,
            audience,
            valid_for_seconds,
            not_before_offset_seconds,
            signing_algorithm,
            signing_key: SecretBox::new(Box::new(signing_key)),
            signing_key_id,
        })
    }

    /// Build the validated token issuer configuration.
    ///
    /// The validity window is checked before any key material is parsed.
    /// An empty key is reported as missing credentials; key material that
    /// does not parse for the configured algorithm is `InvalidSigningKey`.
    pub fn issuer_config(&self) -> Result<IssuerConfig, ConfigError> {
        if self.valid_for_seconds <= 0 {
            return Err(ConfigError::NonPositiveValidity(self.valid_for_seconds));
        }

        let material = self.signing_key.expose_secret();

        let signing_key = if material.is_empty() {
            None
        } else {
            Some(
                SigningKey::from_material(
                    self.signing_key_id.clone(),
                    self.signing_algorithm,
                    material,
                )
                .map_err(|e| ConfigError::InvalidSigningKey(e.to_string()))?,
            )
        };

        let not_before = if self.not_before_offset_seconds == 0 {
            NotBeforePolicy::AtIssuance
        } else {
            NotBeforePolicy::Offset(self.not_before_offset_seconds)
        };

        let mut builder = IssuerConfig::builder(self.issuer.clone(), self.audience.clone())
            .valid_for_seconds(self.valid_for_seconds)
            .not_before(not_before)
            .jti_generator(UuidJtiGenerator);

        if let Some(key) = signing_key {
            builder = builder.signing_key(key);
        }

        builder.build()
    }
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn parse_seconds(
    vars: &HashMap<String, String>,
    name: &str,
    default: i64,
) -> Result<i64, ConfigError> {
    match vars.get(name) {
        Some(value) => value
            .trim()
            .parse::<i64>()
            .map_err(|e| ConfigError::InvalidValue {
                name: name.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(default),
    }
}
