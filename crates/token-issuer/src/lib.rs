//! Token Issuer Service Library
//!
//! Issues signed JWT access tokens on login, renews them from a previously
//! issued token, and validates them for protected resources.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `crypto` - Signing keys and password hashing
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `middleware` - Bearer token validation for protected routes
//! - `observability` - Metrics and log correlation helpers
//! - `repositories` - Database access layer
//! - `routes` - Router construction
//! - `services` - Login and renewal orchestration, credential store seam
//! - `tokens` - Claim construction, signing and reading

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod tokens;
