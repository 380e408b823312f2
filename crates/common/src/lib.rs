//! Utilities shared between the token issuer and the services that consume its tokens.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT utilities (size limit, structural checks, bearer parsing)
pub mod jwt;
