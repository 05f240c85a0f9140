//! Credential claim extraction from request headers.

use axum::http::HeaderMap;

use super::error::AuthFailure;

pub const HEADER_USERNAME: &str = "auth-username";
pub const HEADER_TIMESTAMP: &str = "auth-ts";
pub const HEADER_SALT: &str = "auth-salt";
pub const HEADER_TOKEN: &str = "auth-token";

/// The four-field credential presented with a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialClaim {
    pub principal: String,
    pub timestamp: String,
    pub salt: String,
    pub token: String,
}

impl CredentialClaim {
    /// Pull the claim out of request headers.
    ///
    /// A header that is absent, empty, or not visible ASCII counts as missing.
    /// No partial claims are returned.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AuthFailure> {
        Ok(Self {
            principal: required(headers, HEADER_USERNAME)?,
            timestamp: required(headers, HEADER_TIMESTAMP)?,
            salt: required(headers, HEADER_SALT)?,
            token: required(headers, HEADER_TOKEN)?,
        })
    }
}

fn required(headers: &HeaderMap, name: &str) -> Result<String, AuthFailure> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
        .ok_or(AuthFailure::MissingCredential)
}

/// Best-effort principal for log events on requests that failed extraction.
pub fn claimed_principal(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(HEADER_USERNAME)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}
