//! Secret wrappers for passwords and signing key material.
//!
//! `SecretBox<T>` and `SecretString` redact themselves in `Debug`, so a struct
//! deriving `Debug` around them can be logged with `{:?}` or through `tracing`
//! without exposing the value. Contents are zeroized on drop.
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct LoginForm {
//!     username: String,
//!     password: SecretString,
//! }
//!
//! let form: LoginForm =
//!     serde_json::from_str(r#"{"username": "alice", "password": "hunter2"}"#).unwrap();
//!
//! assert!(!format!("{form:?}").contains("hunter2"));
//! assert_eq!(form.password.expose_secret(), "hunter2");
//! ```
//!
//! Use `SecretString` for user passwords and bearer tokens held beyond a
//! single call, and `SecretBox<Vec<u8>>` for raw key bytes.

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
