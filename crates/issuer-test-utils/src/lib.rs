//! # Issuer Test Utilities
//!
//! Shared test utilities for the token issuer.
//!
//! This crate provides:
//! - Deterministic crypto fixtures (fixed keys for reproducible tests)
//! - Token builders for forged, back-dated and malformed tokens
//! - Server test harness (TestIssuerServer for E2E tests)
//! - Custom assertions (TokenAssertions trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use issuer_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let token = TestTokenBuilder::new()
//!         .for_user("alice")
//!         .issued_at(now - 7200)
//!         .sign(1)?;
//!
//!     token.assert_valid_jwt()
//!          .assert_for_subject("alice")
//!          .assert_signed_by(TEST_KEY_ID);
//! }
//! ```

pub mod assertions;
pub mod crypto_fixtures;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use crypto_fixtures::*;
pub use server_harness::*;
pub use token_builders::*;
