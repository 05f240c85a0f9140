//! Failure taxonomy for the authentication gate.

use std::time::Duration;

/// Errors raised by an [`AccountStore`](super::AccountStore).
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("account store unavailable: {0}")]
    Unavailable(String),
    #[error("account query failed: {0}")]
    Query(String),
    #[error("account lookup timed out after {0:?}")]
    Timeout(Duration),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, _)
                if matches!(
                    e.code,
                    rusqlite::ErrorCode::CannotOpen
                        | rusqlite::ErrorCode::DatabaseBusy
                        | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                Self::Unavailable(err.to_string())
            }
            other => Self::Query(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(err: r2d2::Error) -> Self {
        Self::Unavailable(format!("no pooled connection: {err}"))
    }
}

/// Terminal decision of one authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied,
    ServerError,
}

impl Decision {
    pub fn label(self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::Denied => "denied",
            Self::ServerError => "server_error",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Why an authentication attempt did not succeed.
///
/// Every variant except [`AuthFailure::StoreFailure`] is surfaced to the caller
/// as the same uniform denial; the variant itself only reaches the logs.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthFailure {
    #[error("one or more credential headers missing or empty")]
    MissingCredential,
    #[error("timestamp expired or unparseable")]
    ExpiredOrUnparseableTimestamp,
    #[error("principal not found")]
    PrincipalNotFound,
    #[error("account is locked")]
    AccountLocked,
    #[error("token mismatch")]
    TokenMismatch,
    #[error(transparent)]
    StoreFailure(#[from] StoreError),
}

impl AuthFailure {
    pub fn decision(&self) -> Decision {
        match self {
            Self::StoreFailure(_) => Decision::ServerError,
            _ => Decision::Denied,
        }
    }

    /// Stable tag for log events.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::ExpiredOrUnparseableTimestamp => "expired_timestamp",
            Self::PrincipalNotFound => "principal_not_found",
            Self::AccountLocked => "account_locked",
            Self::TokenMismatch => "token_mismatch",
            Self::StoreFailure(StoreError::Timeout(_)) => "store_timeout",
            Self::StoreFailure(_) => "store_failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_store_failures_are_server_errors() {
        let denied = [
            AuthFailure::MissingCredential,
            AuthFailure::ExpiredOrUnparseableTimestamp,
            AuthFailure::PrincipalNotFound,
            AuthFailure::AccountLocked,
            AuthFailure::TokenMismatch,
        ];
        for failure in denied {
            assert_eq!(failure.decision(), Decision::Denied, "{failure}");
        }

        let err = AuthFailure::from(StoreError::Unavailable("connection refused".into()));
        assert_eq!(err.decision(), Decision::ServerError);
        assert_eq!(err.reason(), "store_failure");
    }

    #[test]
    fn timeout_has_its_own_reason() {
        let err = AuthFailure::from(StoreError::Timeout(Duration::from_millis(5)));
        assert_eq!(err.decision(), Decision::ServerError);
        assert_eq!(err.reason(), "store_timeout");
    }

    #[test]
    fn missing_table_maps_to_query_error() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err = conn
            .query_row("SELECT 1 FROM nowhere", [], |row| row.get::<_, i64>(0))
            .unwrap_err();
        assert!(matches!(StoreError::from(err), StoreError::Query(_)));
    }
}
