//! Credential token derivation and verification.
//!
//! `token = hex(SHA-512(secret_hash || salt || timestamp))`, lowercase hex,
//! with the three inputs fed to the digest in that fixed order.

use sha2::{Digest, Sha512};

use super::account::Account;
use super::claim::CredentialClaim;

/// Length of a hex-encoded SHA-512 digest.
pub const TOKEN_HEX_LEN: usize = 128;

/// Recompute the token a client holding `secret_hash` would send.
pub fn expected_token(secret_hash: &str, salt: &str, timestamp: &str) -> String {
    let mut hash = Sha512::new();
    hash.update(secret_hash.as_bytes());
    hash.update(salt.as_bytes());
    hash.update(timestamp.as_bytes());
    hex::encode(hash.finalize())
}

/// True iff the claim's token matches the one derived from the account's secret hash.
pub fn verify(account: &Account, claim: &CredentialClaim) -> bool {
    let expected = expected_token(&account.secret_hash, &claim.salt, &claim.timestamp);
    constant_time_eq(expected.as_bytes(), claim.token.as_bytes())
}

/// Header values a client sends to authenticate one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialHeaders {
    pub username: String,
    pub timestamp: String,
    pub salt: String,
    pub token: String,
}

/// Client-side counterpart of [`verify`].
pub fn sign_request(
    email: &str,
    secret_hash: &str,
    salt: &str,
    timestamp: &str,
) -> CredentialHeaders {
    CredentialHeaders {
        username: email.to_owned(),
        timestamp: timestamp.to_owned(),
        salt: salt.to_owned(),
        token: expected_token(secret_hash, salt, timestamp),
    }
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
