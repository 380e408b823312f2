pub mod auth_service;
pub mod credential_store;
