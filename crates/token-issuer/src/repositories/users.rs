//! User repository and the Postgres-backed credential store.

use crate::crypto;
use crate::errors::IssuerError;
use crate::services::credential_store::{CredentialStore, UserAttributes};
use chrono::{DateTime, Utc};
use common::secret::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

/// Verified when the user does not exist so both rejection paths cost one
/// bcrypt verification.
const DUMMY_PASSWORD_HASH: &str = "$2b$12$LQv3c1yqBWVHxkd0LHAkCOYz6TtxMQJqhN8/LewY5GyYqExt7YD3a";

/// User model (maps to users table)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub organization_id: i32,
    pub is_organizer: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Token attributes of this user.
    ///
    /// The column is constrained non-negative; a negative value is a corrupt
    /// row and reported as a store failure.
    pub fn attributes(&self) -> Result<UserAttributes, IssuerError> {
        let organization_id = u32::try_from(self.organization_id).map_err(|_| {
            IssuerError::CredentialStore(format!(
                "User {} has invalid organization id {}",
                self.user_id, self.organization_id
            ))
        })?;

        Ok(UserAttributes {
            organization_id,
            is_organizer: self.is_organizer,
        })
    }
}

/// Get user by username.
pub async fn get_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, IssuerError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT
            user_id, username, password_hash, organization_id,
            is_organizer, is_active, created_at
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
    .map_err(|e| IssuerError::CredentialStore(format!("Failed to fetch user by username: {}", e)))?;

    Ok(user)
}

/// Create a new user.
///
/// Returns the created user record.
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    password_hash: &str,
    organization_id: u32,
    is_organizer: bool,
) -> Result<User, IssuerError> {
    let organization_id = i32::try_from(organization_id).map_err(|_| {
        IssuerError::InvalidRequest(format!("Organization id {} is out of range", organization_id))
    })?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, password_hash, organization_id, is_organizer)
        VALUES ($1, $2, $3, $4)
        RETURNING
            user_id, username, password_hash, organization_id,
            is_organizer, is_active, created_at
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .bind(organization_id)
    .bind(is_organizer)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("users_username_key") {
            IssuerError::InvalidRequest("User with this username already exists".to_string())
        } else {
            IssuerError::CredentialStore(format!("Failed to create user: {}", e))
        }
    })?;

    Ok(user)
}

/// Mark a user active or inactive. Inactive users cannot log in.
pub async fn set_active(pool: &PgPool, user_id: Uuid, is_active: bool) -> Result<(), IssuerError> {
    sqlx::query(
        r#"
        UPDATE users
        SET is_active = $2
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .bind(is_active)
    .execute(pool)
    .await
    .map_err(|e| IssuerError::CredentialStore(format!("Failed to update user: {}", e)))?;

    Ok(())
}

/// [`CredentialStore`] backed by the `users` table.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CredentialStore for PgCredentialStore {
    #[instrument(skip_all)]
    async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Option<UserAttributes>, IssuerError> {
        let user = get_by_username(&self.pool, username).await?;

        let hash_to_verify = match &user {
            Some(u) => u.password_hash.as_str(),
            None => DUMMY_PASSWORD_HASH,
        };

        let is_valid = crypto::verify_password(password.expose_secret(), hash_to_verify)
            .map_err(|e| IssuerError::CredentialStore(format!("Stored hash unusable: {}", e)))?;

        match user {
            Some(u) if u.is_active && is_valid => u.attributes().map(Some),
            _ => Ok(None),
        }
    }
}
