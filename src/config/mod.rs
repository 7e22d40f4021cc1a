use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Value of `DATABASE_URL` that selects the in-process store
pub const MEMORY_DATABASE_URL: &str = "memory";

/// Longest accepted `TOKEN_EXPIRATION` (one year)
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url == MEMORY_DATABASE_URL
    }

    /// Database settings alone, for tools that never issue tokens
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::defaults().with_env_overrides()
    }

    fn defaults() -> Self {
        Self {
            url: "postgres://localhost:5432/giftcards".to_string(),
            max_connections: 10,
        }
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(v) = var("DATABASE_URL") {
            self.url = v;
        }
        if let Some(v) = var("DATABASE_MAX_CONNECTIONS") {
            self.max_connections = parse("DATABASE_MAX_CONNECTIONS", v)?;
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub token_secret: String,
    pub token_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Page size used by paginated listings when the client sends none
    pub default_page_limit: u32,
}

impl AppConfig {
    /// Build the configuration from process environment variables.
    ///
    /// `TOKEN_SECRET` is the only value without a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::defaults().with_env_overrides()
    }

    fn defaults() -> Self {
        Self {
            server: ServerConfig { port: 5000 },
            database: DatabaseConfig::defaults(),
            security: SecurityConfig {
                token_secret: String::new(),
                token_ttl_secs: 60 * 60,
            },
            api: ApiConfig {
                default_page_limit: 50,
            },
        }
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(v) = var("PORT").or_else(|| var("EXPRESS_PORT")) {
            self.server.port = parse("PORT", v)?;
        }

        self.database = self.database.with_env_overrides()?;

        self.security.token_secret = var("TOKEN_SECRET").ok_or(ConfigError::Missing("TOKEN_SECRET"))?;
        if let Some(v) = var("TOKEN_EXPIRATION") {
            self.security.token_ttl_secs = token_ttl(v)?;
        }

        if let Some(v) = var("REQ_LIMIT") {
            let limit: u32 = parse("REQ_LIMIT", v.clone())?;
            if limit == 0 {
                return Err(ConfigError::Invalid { name: "REQ_LIMIT", value: v });
            }
            self.api.default_page_limit = limit;
        }

        Ok(self)
    }

    /// Configuration for tests and local tooling: in-memory store, fixed secret
    pub fn for_memory(token_secret: impl Into<String>) -> Self {
        let mut config = Self::defaults();
        config.database.url = MEMORY_DATABASE_URL.to_string();
        config.security.token_secret = token_secret.into();
        config
    }
}

/// Non-empty, trimmed environment variable
fn var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn token_ttl(value: String) -> Result<u64, ConfigError> {
    let ttl: u64 = parse("TOKEN_EXPIRATION", value.clone())?;
    if ttl > MAX_TOKEN_TTL_SECS {
        return Err(ConfigError::Invalid { name: "TOKEN_EXPIRATION", value });
    }
    Ok(ttl)
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}
