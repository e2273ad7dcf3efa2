use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::idgen::{DEFAULT_ID_LENGTH, DEFAULT_MAX_ATTEMPTS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    /// Prefix for returned short URLs, e.g. `https://sho.rt`.
    /// If None, built from the request's Host header.
    pub public_base_url: Option<String>,
    pub short_id: ShortIdConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
    /// Process-lifetime storage; everything is lost on restart.
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortIdConfig {
    pub length: usize,
    pub max_attempts: u32,
}

impl Default for ShortIdConfig {
    fn default() -> Self {
        Self {
            length: DEFAULT_ID_LENGTH,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl DatabaseBackend {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            "memory" => DatabaseBackend::Memory,
            "sqlite" => DatabaseBackend::Sqlite,
            other => {
                warn!(
                    "Unknown DATABASE_BACKEND '{other}', falling back to 'sqlite'. Supported values: sqlite, postgres, memory"
                );
                DatabaseBackend::Sqlite
            }
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let backend = DatabaseBackend::parse(&get("DATABASE_BACKEND", "sqlite"));
        let database_url = get("DATABASE_URL", "sqlite://./database.db");
        let max_connections = get("DATABASE_MAX_CONNECTIONS", "5")
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;
        if max_connections == 0 {
            bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }

        let host = get("HOST", "0.0.0.0");
        let port = get("PORT", "8080")
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let public_base_url = lookup("PUBLIC_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let length = get("SHORT_ID_LENGTH", &DEFAULT_ID_LENGTH.to_string())
            .parse::<usize>()
            .context("SHORT_ID_LENGTH must be an integer")?;
        if !(1..=64).contains(&length) {
            bail!("SHORT_ID_LENGTH must be between 1 and 64, got {length}");
        }

        let max_attempts = get("SHORT_ID_MAX_ATTEMPTS", &DEFAULT_MAX_ATTEMPTS.to_string())
            .parse::<u32>()
            .context("SHORT_ID_MAX_ATTEMPTS must be an integer")?;
        if max_attempts == 0 {
            bail!("SHORT_ID_MAX_ATTEMPTS must be at least 1");
        }

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            server: ServerConfig { host, port },
            public_base_url,
            short_id: ShortIdConfig {
                length,
                max_attempts,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database.backend, DatabaseBackend::Sqlite);
        assert_eq!(config.database.url, "sqlite://./database.db");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.public_base_url, None);
        assert_eq!(config.short_id.length, 7);
        assert_eq!(config.short_id.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn test_backend_selection() {
        let config = config_from(&[("DATABASE_BACKEND", "PostgreSQL")]).unwrap();
        assert_eq!(config.database.backend, DatabaseBackend::Postgres);
        let config = config_from(&[("DATABASE_BACKEND", "memory")]).unwrap();
        assert_eq!(config.database.backend, DatabaseBackend::Memory);
        let config = config_from(&[("DATABASE_BACKEND", "mongo")]).unwrap();
        assert_eq!(config.database.backend, DatabaseBackend::Sqlite);
    }

    #[test]
    fn test_public_base_url_is_normalized() {
        let config = config_from(&[("PUBLIC_BASE_URL", "https://sho.rt/")]).unwrap();
        assert_eq!(config.public_base_url.as_deref(), Some("https://sho.rt"));
        let config = config_from(&[("PUBLIC_BASE_URL", "")]).unwrap();
        assert_eq!(config.public_base_url, None);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(config_from(&[("PORT", "eighty")]).is_err());
        assert!(config_from(&[("SHORT_ID_LENGTH", "0")]).is_err());
        assert!(config_from(&[("SHORT_ID_LENGTH", "65")]).is_err());
        assert!(config_from(&[("SHORT_ID_MAX_ATTEMPTS", "0")]).is_err());
        assert!(config_from(&[("DATABASE_MAX_CONNECTIONS", "0")]).is_err());
        assert!(config_from(&[("DATABASE_MAX_CONNECTIONS", "-1")]).is_err());
        assert!(config_from(&[("DATABASE_MAX_CONNECTIONS", "1")]).is_ok());
        assert!(config_from(&[("SHORT_ID_LENGTH", "16")]).is_ok());
    }
}
