//! Configuration management
//!
//! Loaded once from environment variables at process start and passed by
//! reference to the components that need it.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::journal::JournalConfig;

/// Errors raised while reading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,
    /// Directory holding the journal and snapshots
    pub data_dir: PathBuf,
    /// Journal records between snapshots
    pub snapshot_threshold: usize,
    pub auth: AuthConfig,
}

/// Token and credential settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for access tokens; generated and persisted when unset
    pub jwt_secret: Option<String>,
    /// Access token lifetime in seconds
    pub access_token_ttl: i64,
    /// bcrypt work factor for new password hashes
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            access_token_ttl: 1800,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            data_dir: PathBuf::from("data"),
            snapshot_threshold: 1000,
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// - `SLOTSWAP_BIND_ADDR` (default `127.0.0.1:8000`)
    /// - `SLOTSWAP_DATA_DIR` (default `data`)
    /// - `SLOTSWAP_SNAPSHOT_THRESHOLD` (default 1000)
    /// - `SLOTSWAP_JWT_SECRET` (min 32 chars; see `auth::resolve_secret`)
    /// - `SLOTSWAP_ACCESS_TOKEN_TTL` seconds (default 1800)
    /// - `SLOTSWAP_BCRYPT_COST` (default `bcrypt::DEFAULT_COST`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Ok(Self {
            bind_addr: parse_or(&lookup, "SLOTSWAP_BIND_ADDR", defaults.bind_addr)?,
            data_dir: lookup("SLOTSWAP_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            snapshot_threshold: parse_or(
                &lookup,
                "SLOTSWAP_SNAPSHOT_THRESHOLD",
                defaults.snapshot_threshold,
            )?,
            auth: AuthConfig {
                jwt_secret: lookup("SLOTSWAP_JWT_SECRET").filter(|s| !s.is_empty()),
                access_token_ttl: parse_or(
                    &lookup,
                    "SLOTSWAP_ACCESS_TOKEN_TTL",
                    defaults.auth.access_token_ttl,
                )?,
                bcrypt_cost: parse_or(&lookup, "SLOTSWAP_BCRYPT_COST", defaults.auth.bcrypt_cost)?,
            },
        })
    }

    /// Journal settings derived from this configuration
    pub fn journal(&self) -> JournalConfig {
        JournalConfig::new(&self.data_dir).with_snapshot_threshold(self.snapshot_threshold)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.bind_addr.port(), 8000);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.snapshot_threshold, 1000);
        assert_eq!(config.auth.access_token_ttl, 1800);
        assert!(config.auth.jwt_secret.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("SLOTSWAP_BIND_ADDR", "0.0.0.0:9000"),
            ("SLOTSWAP_DATA_DIR", "/var/lib/slotswap"),
            ("SLOTSWAP_SNAPSHOT_THRESHOLD", "50"),
            ("SLOTSWAP_JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("SLOTSWAP_ACCESS_TOKEN_TTL", "60"),
            ("SLOTSWAP_BCRYPT_COST", "4"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.journal().snapshot_threshold, 50);
        assert_eq!(
            config.journal().journal_path(),
            PathBuf::from("/var/lib/slotswap/journal.jsonl")
        );
        assert_eq!(config.auth.access_token_ttl, 60);
        assert_eq!(config.auth.bcrypt_cost, 4);
        assert!(config.auth.jwt_secret.is_some());
    }

    #[test]
    fn test_malformed_number_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[("SLOTSWAP_ACCESS_TOKEN_TTL", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("SLOTSWAP_ACCESS_TOKEN_TTL"));
    }
}
