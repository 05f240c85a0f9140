//! Decision & propagation: runs the per-request pipeline
//! extract → freshness → lookup → lock → verify and yields one terminal decision.

use axum::http::HeaderMap;
use std::sync::Arc;
use std::time::Duration;

use super::account::SanitizedAccount;
use super::claim::{claimed_principal, CredentialClaim};
use super::error::{AuthFailure, StoreError};
use super::freshness::{Freshness, FreshnessChecker};
use super::store::AccountStore;
use super::verifier;
use crate::config::AuthenticationConfig;

/// Stateless authentication gate. Cheap to clone; shares the store.
#[derive(Clone)]
pub struct AuthGate {
    freshness: FreshnessChecker,
    store: Arc<dyn AccountStore>,
    lookup_timeout: Duration,
}

impl AuthGate {
    pub fn new(
        freshness: FreshnessChecker,
        store: Arc<dyn AccountStore>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            freshness,
            store,
            lookup_timeout,
        }
    }

    pub fn from_config(config: &AuthenticationConfig, store: Arc<dyn AccountStore>) -> Self {
        Self::new(
            FreshnessChecker::from_secs(config.auth_window_seconds),
            store,
            Duration::from_millis(config.lookup_timeout_ms),
        )
    }

    /// Authenticate one request and log the terminal decision.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<SanitizedAccount, AuthFailure> {
        let result = self.evaluate(headers).await;
        let principal = claimed_principal(headers).unwrap_or("<none>");

        match &result {
            Ok(account) => {
                tracing::info!(principal = %account.email, decision = "allowed", "Request authenticated");
            }
            Err(failure) => match failure {
                AuthFailure::StoreFailure(detail) => tracing::error!(
                    principal,
                    decision = %failure.decision(),
                    reason = failure.reason(),
                    error = %detail,
                    "Account lookup failed; refusing request"
                ),
                _ => tracing::warn!(
                    principal,
                    decision = %failure.decision(),
                    reason = failure.reason(),
                    "Denying request"
                ),
            },
        }

        result
    }

    async fn evaluate(&self, headers: &HeaderMap) -> Result<SanitizedAccount, AuthFailure> {
        let claim = CredentialClaim::from_headers(headers)?;

        if self.freshness.check(&claim.timestamp) == Freshness::Expired {
            return Err(AuthFailure::ExpiredOrUnparseableTimestamp);
        }

        let account = tokio::time::timeout(
            self.lookup_timeout,
            self.store.find_by_principal(&claim.principal),
        )
        .await
        .map_err(|_| StoreError::Timeout(self.lookup_timeout))??
        .ok_or(AuthFailure::PrincipalNotFound)?;

        if account.locked {
            return Err(AuthFailure::AccountLocked);
        }

        if !verifier::verify(&account, &claim) {
            return Err(AuthFailure::TokenMismatch);
        }

        Ok(account.sanitized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::account::Account;
    use crate::auth::claim::{HEADER_SALT, HEADER_TIMESTAMP, HEADER_TOKEN, HEADER_USERNAME};
    use crate::auth::error::Decision;
    use crate::auth::store::MemoryAccountStore;
    use crate::auth::verifier::expected_token;
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};

    const WINDOW_SECS: u64 = 60;

    fn account(locked: bool) -> Account {
        Account {
            email: "a@x.com".into(),
            first_name: Some("Ada".into()),
            surname: None,
            groups: vec!["admin".into()],
            secret_hash: "hash_of_a".into(),
            salt: Some("account_salt".into()),
            locked,
        }
    }

    fn gate_with(store: Arc<dyn AccountStore>) -> AuthGate {
        AuthGate::new(
            FreshnessChecker::from_secs(WINDOW_SECS),
            store,
            Duration::from_millis(200),
        )
    }

    fn memory_gate(locked: bool) -> (Arc<MemoryAccountStore>, AuthGate) {
        let store = Arc::new(MemoryAccountStore::with_accounts([account(locked)]));
        let gate = gate_with(store.clone());
        (store, gate)
    }

    fn now_ts() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    fn headers(principal: &str, ts: &str, salt: &str, token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_USERNAME, HeaderValue::from_str(principal).unwrap());
        headers.insert(HEADER_TIMESTAMP, HeaderValue::from_str(ts).unwrap());
        headers.insert(HEADER_SALT, HeaderValue::from_str(salt).unwrap());
        headers.insert(HEADER_TOKEN, HeaderValue::from_str(token).unwrap());
        headers
    }

    fn signed(ts: &str) -> HeaderMap {
        let token = expected_token("hash_of_a", "s1", ts);
        headers("a@x.com", ts, "s1", &token)
    }

    #[tokio::test]
    async fn valid_claim_is_allowed_and_sanitized() {
        let (_store, gate) = memory_gate(false);
        let identity = gate.authenticate(&signed(&now_ts())).await.unwrap();

        assert_eq!(identity.email, "a@x.com");
        let json = serde_json::to_string(&identity).unwrap();
        assert!(!json.contains("hash_of_a"));
        assert!(!json.contains("account_salt"));
    }

    #[tokio::test]
    async fn locked_account_is_denied() {
        let (_store, gate) = memory_gate(true);
        let err = gate.authenticate(&signed(&now_ts())).await.unwrap_err();
        assert!(matches!(err, AuthFailure::AccountLocked));
        assert_eq!(err.decision(), Decision::Denied);
    }

    #[tokio::test]
    async fn stale_timestamp_is_denied_despite_correct_token() {
        let (_store, gate) = memory_gate(false);
        let stale = (Utc::now() - ChronoDuration::seconds(WINDOW_SECS as i64 + 1))
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let err = gate.authenticate(&signed(&stale)).await.unwrap_err();
        assert!(matches!(err, AuthFailure::ExpiredOrUnparseableTimestamp));
    }

    #[tokio::test]
    async fn future_timestamp_is_denied() {
        let (_store, gate) = memory_gate(false);
        let ahead = (Utc::now() + ChronoDuration::seconds(WINDOW_SECS as i64 + 5))
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let err = gate.authenticate(&signed(&ahead)).await.unwrap_err();
        assert!(matches!(err, AuthFailure::ExpiredOrUnparseableTimestamp));
    }

    #[tokio::test]
    async fn unknown_principal_is_denied() {
        let (_store, gate) = memory_gate(false);
        let ts = now_ts();
        let token = expected_token("hash_of_a", "s1", &ts);
        let err = gate
            .authenticate(&headers("ghost@x.com", &ts, "s1", &token))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthFailure::PrincipalNotFound));
    }

    #[tokio::test]
    async fn wrong_token_is_denied() {
        let (_store, gate) = memory_gate(false);
        let ts = now_ts();
        let token = expected_token("hash_of_b", "s1", &ts);
        let err = gate
            .authenticate(&headers("a@x.com", &ts, "s1", &token))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthFailure::TokenMismatch));
    }

    #[tokio::test]
    async fn missing_header_is_denied_before_lookup() {
        let (store, gate) = memory_gate(false);
        // An outage would surface as a server error if the store were consulted.
        store.set_outage(Some("down"));

        let mut h = signed(&now_ts());
        h.remove(HEADER_SALT);
        let err = gate.authenticate(&h).await.unwrap_err();
        assert!(matches!(err, AuthFailure::MissingCredential));
    }

    #[tokio::test]
    async fn expired_timestamp_is_denied_before_lookup() {
        let (store, gate) = memory_gate(false);
        store.set_outage(Some("down"));

        let err = gate.authenticate(&signed("garbage")).await.unwrap_err();
        assert!(matches!(err, AuthFailure::ExpiredOrUnparseableTimestamp));
    }

    #[tokio::test]
    async fn store_outage_is_server_error() {
        let (store, gate) = memory_gate(false);
        store.set_outage(Some("connection refused"));

        let err = gate.authenticate(&signed(&now_ts())).await.unwrap_err();
        assert!(matches!(
            err,
            AuthFailure::StoreFailure(StoreError::Unavailable(_))
        ));
        assert_eq!(err.decision(), Decision::ServerError);
    }

    struct StalledStore;

    #[async_trait]
    impl AccountStore for StalledStore {
        async fn find_by_principal(&self, _principal: &str) -> Result<Option<Account>, StoreError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(None)
        }
    }

    #[tokio::test]
    async fn slow_lookup_times_out_as_server_error() {
        let gate = AuthGate::new(
            FreshnessChecker::from_secs(WINDOW_SECS),
            Arc::new(StalledStore),
            Duration::from_millis(20),
        );

        let err = gate.authenticate(&signed(&now_ts())).await.unwrap_err();
        assert!(matches!(err, AuthFailure::StoreFailure(StoreError::Timeout(_))));
        assert_eq!(err.decision(), Decision::ServerError);
    }

    #[tokio::test]
    async fn from_config_uses_window() {
        let config = AuthenticationConfig {
            auth_window_seconds: 1,
            lookup_timeout_ms: 500,
        };
        let store = Arc::new(MemoryAccountStore::with_accounts([account(false)]));
        let gate = AuthGate::from_config(&config, store);

        let old = (Utc::now() - ChronoDuration::seconds(10)).to_rfc3339_opts(SecondsFormat::Millis, true);
        assert!(gate.authenticate(&signed(&old)).await.is_err());
        assert!(gate.authenticate(&signed(&now_ts())).await.is_ok());
    }
}
