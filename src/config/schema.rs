//! TOML configuration.
//!
//! Loaded once at startup; the authentication section is copied into the gate
//! and never re-read while serving.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides `authentication.auth_window_seconds`.
pub const ENV_AUTH_WINDOW_SECONDS: &str = "STAMPGATE_AUTH_WINDOW_SECONDS";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub authentication: AuthenticationConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub max_body_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3447,
            request_timeout_secs: 30,
            max_body_bytes: 65_536,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticationConfig {
    /// Allowed drift, in seconds, between a claimed timestamp and now (both directions).
    pub auth_window_seconds: u64,
    /// Upper bound on one account store lookup.
    pub lookup_timeout_ms: u64,
}

impl Default for AuthenticationConfig {
    fn default() -> Self {
        Self {
            auth_window_seconds: 60,
            lookup_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: "accounts.db".into(),
        }
    }
}

impl StoreConfig {
    /// `db_path` with `~` and environment variables expanded.
    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.db_path)
            .with_context(|| format!("Failed to expand store.db_path '{}'", self.db_path))?;
        Ok(PathBuf::from(expanded.as_ref()))
    }
}

impl Config {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config = Self::from_toml(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise start from defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let mut config = Self::default();
                config.apply_env_overrides(|key| std::env::var(key).ok())?;
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = lookup(ENV_AUTH_WINDOW_SECONDS) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                self.authentication.auth_window_seconds = trimmed
                    .parse()
                    .with_context(|| format!("{ENV_AUTH_WINDOW_SECONDS} must be an integer"))?;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.authentication.auth_window_seconds == 0 {
            bail!("authentication.auth_window_seconds must be greater than zero");
        }
        if self.authentication.lookup_timeout_ms == 0 {
            bail!("authentication.lookup_timeout_ms must be greater than zero");
        }
        if self.gateway.request_timeout_secs == 0 {
            bail!("gateway.request_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}
