use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;

use crate::auth::jwt::{
    JwtConfig, DEFAULT_ACCESS_EXPIRY_MINS, DEFAULT_REFRESH_EXPIRY_DAYS, MAX_ACCESS_EXPIRY_MINS,
    MAX_REFRESH_EXPIRY_DAYS,
};

/// Longest accepted store round-trip deadline.
const MAX_REDIS_OP_TIMEOUT_MS: u64 = 60_000;

/// Startup configuration problems. Reported once and the process exits.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Session store connection settings.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Connection URL (default: `redis://127.0.0.1:6379`).
    pub url: String,
    /// Deadline for every store round-trip (default: 2s).
    pub op_timeout: Duration,
}

/// Server configuration loaded from environment variables.
///
/// Everything except the secret and the database URL has a default suitable
/// for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// PostgreSQL URL for the user table.
    pub database_url: String,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    pub redis: RedisConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                   |
    /// |---------------------------|---------------------------|
    /// | `HOST`                    | `0.0.0.0`                 |
    /// | `PORT`                    | `8080`                    |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`   |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                      |
    /// | `DATABASE_URL`            | required                  |
    /// | `JWT_SECRET`              | required                  |
    /// | `JWT_ACCESS_EXPIRY_MINS`  | `15`                      |
    /// | `JWT_REFRESH_EXPIRY_DAYS` | `7`                       |
    /// | `REDIS_URL`               | `redis://127.0.0.1:6379`  |
    /// | `REDIS_OP_TIMEOUT_MS`     | `2000`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let host = env.or("HOST", "0.0.0.0");
        let port: u16 = env.parse("PORT", 8080)?;

        let cors_origins: Vec<String> = env
            .or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        for origin in &cors_origins {
            origin
                .parse::<HeaderValue>()
                .map_err(|e| ConfigError::Invalid {
                    var: "CORS_ORIGINS",
                    reason: format!("'{origin}': {e}"),
                })?;
        }

        let request_timeout_secs: u64 = env.parse("REQUEST_TIMEOUT_SECS", 30)?;
        let database_url = env.required("DATABASE_URL")?;

        let jwt = JwtConfig {
            secret: env.required("JWT_SECRET")?,
            access_token_expiry_mins: env.bounded(
                "JWT_ACCESS_EXPIRY_MINS",
                DEFAULT_ACCESS_EXPIRY_MINS,
                MAX_ACCESS_EXPIRY_MINS,
            )?,
            refresh_token_expiry_days: env.bounded(
                "JWT_REFRESH_EXPIRY_DAYS",
                DEFAULT_REFRESH_EXPIRY_DAYS,
                MAX_REFRESH_EXPIRY_DAYS,
            )?,
        };

        let redis = RedisConfig {
            url: env.or("REDIS_URL", "redis://127.0.0.1:6379"),
            op_timeout: Duration::from_millis(env.bounded(
                "REDIS_OP_TIMEOUT_MS",
                2000,
                MAX_REDIS_OP_TIMEOUT_MS,
            )?),
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            jwt,
            redis,
        })
    }
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|v| !v.trim().is_empty())
    }

    fn or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.get(name).ok_or(ConfigError::Missing(name))
    }

    fn parse<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(name) {
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                var: name,
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }

    /// Parse a value in `1..=max`.
    fn bounded<T>(&self, name: &'static str, default: T, max: T) -> Result<T, ConfigError>
    where
        T: FromStr + PartialOrd + Default + std::fmt::Display,
        T::Err: std::fmt::Display,
    {
        let value = self.parse(name, default)?;
        if value <= T::default() {
            return Err(ConfigError::Invalid {
                var: name,
                reason: "must be greater than zero".into(),
            });
        }
        if value > max {
            return Err(ConfigError::Invalid {
                var: name,
                reason: format!("must be at most {max}"),
            });
        }
        Ok(value)
    }
}
