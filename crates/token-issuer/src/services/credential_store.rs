//! Credential store seam.
//!
//! The issuer never sees password hashes; it asks a [`CredentialStore`]
//! whether a username/password pair matches and, if so, which attributes go
//! into the token. Unknown user and wrong password both answer `Ok(None)`.

use crate::errors::IssuerError;
use common::secret::SecretString;

/// Attributes of an authenticated user that are carried in issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserAttributes {
    /// 0 means no organization.
    pub organization_id: u32,
    pub is_organizer: bool,
}

/// Validates username/password pairs.
///
/// `Err` is reserved for the store itself failing (unreachable database,
/// corrupt row); it is never used to signal a bad password.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Option<UserAttributes>, IssuerError>;
}

/// In-memory credential store for tests.
pub mod mock {
    use super::*;
    use common::secret::ExposeSecret;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock credential store with a fixed user table.
    #[derive(Default)]
    pub struct MockCredentialStore {
        /// username -> (password, attributes)
        users: HashMap<String, (String, UserAttributes)>,
        /// Number of calls made.
        call_count: AtomicUsize,
        /// Whether to return errors.
        return_error: bool,
    }

    impl MockCredentialStore {
        /// Create a store with no users.
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a user.
        pub fn with_user(
            mut self,
            username: &str,
            password: &str,
            attributes: UserAttributes,
        ) -> Self {
            self.users
                .insert(username.to_string(), (password.to_string(), attributes));
            self
        }

        /// Create a store whose every lookup fails.
        pub fn failing() -> Self {
            Self {
                return_error: true,
                ..Self::default()
            }
        }

        /// Get the number of calls made.
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl CredentialStore for MockCredentialStore {
        async fn authenticate(
            &self,
            username: &str,
            password: &SecretString,
        ) -> Result<Option<UserAttributes>, IssuerError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            if self.return_error {
                return Err(IssuerError::CredentialStore(
                    "Mock credential store error".to_string(),
                ));
            }

            Ok(self
                .users
                .get(username)
                .filter(|(expected, _)| expected == password.expose_secret())
                .map(|(_, attributes)| *attributes))
        }
    }

}
