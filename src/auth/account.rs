//! Account records as returned by the account store, and the sanitized
//! identity that is attached to an authenticated request.

use serde::{Deserialize, Serialize};

/// A stored account. Owned by the account store; the gate only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Principal identifier (unique key).
    pub email: String,
    pub first_name: Option<String>,
    pub surname: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    /// Pre-computed hash of the account's durable secret (hex).
    pub secret_hash: String,
    /// Salt the durable secret was hashed with, if the store keeps one.
    pub salt: Option<String>,
    #[serde(default)]
    pub locked: bool,
}

impl Account {
    /// Build a fresh copy with every secret-bearing field dropped.
    ///
    /// The store-returned record is left untouched.
    pub fn sanitized(&self) -> SanitizedAccount {
        SanitizedAccount {
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            surname: self.surname.clone(),
            groups: self.groups.clone(),
            locked: self.locked,
        }
    }
}

/// Identity attached to the request context after a successful authentication.
///
/// Has no secret hash or salt field, so it cannot leak them when serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizedAccount {
    pub email: String,
    pub first_name: Option<String>,
    pub surname: Option<String>,
    pub groups: Vec<String>,
    pub locked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account {
            email: "a@x.com".into(),
            first_name: Some("Ada".into()),
            surname: Some("Lovelace".into()),
            groups: vec!["admin".into()],
            secret_hash: "deadbeef".into(),
            salt: Some("pepper".into()),
            locked: false,
        }
    }

    #[test]
    fn sanitized_keeps_identity_fields() {
        let sanitized = account().sanitized();
        assert_eq!(sanitized.email, "a@x.com");
        assert_eq!(sanitized.first_name.as_deref(), Some("Ada"));
        assert_eq!(sanitized.groups, vec!["admin".to_string()]);
        assert!(!sanitized.locked);
    }

    #[test]
    fn sanitized_json_has_no_secret_fields() {
        let json = serde_json::to_value(account().sanitized()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("secret_hash"));
        assert!(!obj.contains_key("salt"));
        assert!(!json.to_string().contains("deadbeef"));
        assert!(!json.to_string().contains("pepper"));
    }

    #[test]
    fn sanitizing_leaves_original_intact() {
        let original = account();
        let _ = original.sanitized();
        assert_eq!(original.secret_hash, "deadbeef");
        assert_eq!(original.salt.as_deref(), Some("pepper"));
    }
}
