//! Stateless per-request authentication gate for HTTP resource APIs.
//!
//! Callers sign each request with `SHA-512(secret_hash || salt || timestamp)`;
//! the gate checks freshness, looks the account up, refuses locked accounts,
//! verifies the token and hands a sanitized identity to the next stage.

pub mod auth;
pub mod config;
pub mod gateway;

pub use auth::{AuthFailure, AuthGate, Decision, SanitizedAccount};
pub use config::Config;
