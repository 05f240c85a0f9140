//! Account store adapters.
//!
//! The gate only ever reads accounts, by principal (email). Two adapters:
//! - [`SqliteAccountStore`]: SQLite-backed, queries run off the async runtime
//! - [`MemoryAccountStore`]: in-process map, for embedding and tests
//!
//! Tables:
//! - `accounts`: email, first_name, surname, groups (JSON array), secret_hash, salt, locked

use async_trait::async_trait;
use parking_lot::RwLock;
use r2d2_sqlite::SqliteConnectionManager;
use std::collections::HashMap;
use std::path::Path;

use super::account::Account;
use super::error::StoreError;

/// Upper bound on pooled SQLite connections; each lookup checks one out.
const MAX_POOL_SIZE: u32 = 8;

/// Read access to accounts, keyed by principal.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fetch the account for `principal`. `Ok(None)` means no such account.
    async fn find_by_principal(&self, principal: &str) -> Result<Option<Account>, StoreError>;
}

// ── SQLite ──────────────────────────────────────────────────────────

/// SQLite-backed account store.
///
/// Lookups run on a pool of WAL-mode connections so one slow query does not
/// hold up lookups for other requests.
pub struct SqliteAccountStore {
    pool: r2d2::Pool<SqliteConnectionManager>,
}

impl SqliteAccountStore {
    /// Open (or create) the account database at the given path.
    pub fn open(db_path: &Path) -> anyhow::Result<Self> {
        Self::open_with_pool_size(db_path, MAX_POOL_SIZE)
    }

    pub fn open_with_pool_size(db_path: &Path, max_size: u32) -> anyhow::Result<Self> {
        // WAL mode for concurrent reads + crash safety
        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;",
            )
        });
        let pool = r2d2::Pool::builder()
            .max_size(max_size.max(1))
            .build(manager)?;

        pool.get()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS accounts (
                email TEXT PRIMARY KEY,
                first_name TEXT,
                surname TEXT,
                groups TEXT NOT NULL DEFAULT '[]',
                secret_hash TEXT NOT NULL,
                salt TEXT,
                locked INTEGER NOT NULL DEFAULT 0
            );",
        )?;

        Ok(Self { pool })
    }

    /// Insert or replace an account record. Used to seed fixtures.
    pub fn put_account(&self, account: &Account) -> anyhow::Result<()> {
        let groups = serde_json::to_string(&account.groups)?;
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO accounts (email, first_name, surname, groups, secret_hash, salt, locked)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(email) DO UPDATE SET
                first_name = excluded.first_name,
                surname = excluded.surname,
                groups = excluded.groups,
                secret_hash = excluded.secret_hash,
                salt = excluded.salt,
                locked = excluded.locked",
            rusqlite::params![
                account.email,
                account.first_name,
                account.surname,
                groups,
                account.secret_hash,
                account.salt,
                account.locked,
            ],
        )?;
        Ok(())
    }

    fn query_account(
        conn: &rusqlite::Connection,
        principal: &str,
    ) -> Result<Option<Account>, StoreError> {
        let row = conn.query_row(
            "SELECT email, first_name, surname, groups, secret_hash, salt, locked
             FROM accounts WHERE email = ?1",
            rusqlite::params![principal],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, bool>(6)?,
                ))
            },
        );

        match row {
            Ok((email, first_name, surname, groups, secret_hash, salt, locked)) => {
                let groups: Vec<String> = serde_json::from_str(&groups)
                    .map_err(|e| StoreError::Query(format!("malformed groups column: {e}")))?;
                Ok(Some(Account {
                    email,
                    first_name,
                    surname,
                    groups,
                    secret_hash,
                    salt,
                    locked,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn find_by_principal(&self, principal: &str) -> Result<Option<Account>, StoreError> {
        let pool = self.pool.clone();
        let principal = principal.to_owned();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            Self::query_account(&conn, &principal)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("lookup task failed: {e}")))?
    }
}

// ── In-memory ───────────────────────────────────────────────────────

/// In-process account map.
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
    outage: RwLock<Option<String>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let store = Self::new();
        for account in accounts {
            store.insert(account);
        }
        store
    }

    pub fn insert(&self, account: Account) {
        self.accounts.write().insert(account.email.clone(), account);
    }

    /// Make every subsequent lookup fail with `StoreError::Unavailable(message)`.
    /// `None` restores normal operation.
    pub fn set_outage(&self, message: Option<&str>) {
        *self.outage.write() = message.map(ToOwned::to_owned);
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_principal(&self, principal: &str) -> Result<Option<Account>, StoreError> {
        if let Some(message) = self.outage.read().as_ref() {
            return Err(StoreError::Unavailable(message.clone()));
        }
        Ok(self.accounts.read().get(principal).cloned())
    }
}

// ── Tests ───────────────────────────────────────────────────────────
