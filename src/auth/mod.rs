//! Per-request credential authentication.
//!
//! Each request carries four headers (`auth-username`, `auth-ts`, `auth-salt`,
//! `auth-token`). The gate checks them in a fixed order and stops at the first
//! failure:
//! - all four present and non-empty
//! - timestamp inside the freshness window
//! - account exists in the store
//! - account is not locked
//! - token equals `SHA-512(secret_hash || salt || timestamp)`
//!
//! ## Design Decisions
//! - Stateless: no nonce cache, so replay is bounded only by the window.
//! - Every denial looks the same to the caller; the reason goes to the log only.
//! - Store failures are reported as server errors, never as denials.
//! - The identity handed downstream is a fresh [`SanitizedAccount`] without
//!   secret hash or salt.

pub mod account;
pub mod claim;
pub mod error;
pub mod freshness;
pub mod gate;
pub mod store;
pub mod verifier;

pub use account::{Account, SanitizedAccount};
pub use claim::CredentialClaim;
pub use error::{AuthFailure, Decision, StoreError};
pub use freshness::{Freshness, FreshnessChecker};
pub use gate::AuthGate;
pub use store::{AccountStore, MemoryAccountStore, SqliteAccountStore};
pub use verifier::{expected_token, sign_request, CredentialHeaders};
