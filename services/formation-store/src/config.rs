//! Environment configuration.
//!
//! | Variable | Default |
//! |---|---|
//! | `DATABASE_URL` | `postgres://localhost/formation` |
//! | `DB_MAX_CONNECTIONS` | 5 |
//! | `DB_MIN_CONNECTIONS` | 0 |
//! | `DB_ACQUIRE_TIMEOUT_SECS` | 5 |
//! | `FORMATION_MIGRATIONS_DIR` | the crate's `migrations/` |
//! | `FORMATION_LOG_LEVEL` | `info` (`RUST_LOG` wins when set) |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::db::DbConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub database: DbConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = DbConfig::default();

        let database = DbConfig {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: number(&lookup, "DB_MAX_CONNECTIONS")?
                .unwrap_or(defaults.max_connections),
            min_connections: number(&lookup, "DB_MIN_CONNECTIONS")?
                .unwrap_or(defaults.min_connections),
            acquire_timeout: number(&lookup, "DB_ACQUIRE_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.acquire_timeout),
            migrations_dir: lookup("FORMATION_MIGRATIONS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.migrations_dir),
        };

        if database.max_connections == 0 {
            bail!("DB_MAX_CONNECTIONS must be at least 1");
        }
        if database.min_connections > database.max_connections {
            bail!(
                "DB_MIN_CONNECTIONS ({}) exceeds DB_MAX_CONNECTIONS ({})",
                database.min_connections,
                database.max_connections
            );
        }

        Ok(Self {
            log_level: lookup("FORMATION_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            database,
        })
    }
}

fn number<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .with_context(|| format!("{name} is not a valid number: {raw:?}"))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.database.database_url, "postgres://localhost/formation");
        assert_eq!(config.database.acquire_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("DATABASE_URL", "postgres://db:5432/formation"),
            ("DB_MAX_CONNECTIONS", "20"),
            ("DB_MIN_CONNECTIONS", "2"),
            ("DB_ACQUIRE_TIMEOUT_SECS", " 30 "),
            ("FORMATION_MIGRATIONS_DIR", "/srv/formation/migrations"),
            ("FORMATION_LOG_LEVEL", "debug"),
        ])
        .unwrap();

        assert_eq!(config.database.database_url, "postgres://db:5432/formation");
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.database.min_connections, 2);
        assert_eq!(config.database.acquire_timeout, Duration::from_secs(30));
        assert_eq!(
            config.database.migrations_dir,
            PathBuf::from("/srv/formation/migrations")
        );
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_rejects_bad_numbers() {
        let err = config(&[("DB_ACQUIRE_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("DB_ACQUIRE_TIMEOUT_SECS"));
        assert!(config(&[("DB_MAX_CONNECTIONS", "-1")]).is_err());
    }

    #[test]
    fn test_rejects_inverted_pool_bounds() {
        assert!(config(&[("DB_MAX_CONNECTIONS", "2"), ("DB_MIN_CONNECTIONS", "3")]).is_err());
        assert!(config(&[("DB_MAX_CONNECTIONS", "0")]).is_err());
    }
}
