use std::{env, str::FromStr, time::Duration};

use thiserror::Error;

/// Local-only signing secret used when `JWT_SECRET` is not provided.
pub const LOCAL_JWT_SECRET: &str = "dev-secret-change-me";

/// Seven days, the lifetime of a token minted at signin.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Upper bound accepted for `JWT_TTL_SECS`: one year.
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// AppConfig
///
/// Holds the application's entire configuration state. It is constructed exactly once
/// at startup and then shared, read-only, through `AppState` and `FromRef`. Nothing in
/// the crate reads the environment after `load` has returned.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and which secrets are mandatory.
    pub env: Env,
    // Interface the HTTP listener binds to.
    pub host: String,
    // Port the HTTP listener binds to.
    pub port: u16,
    // Postgres connection string. `None` selects the in-memory store (local only).
    pub db_url: Option<String>,
    // Secret key used to sign and verify JWTs.
    pub jwt_secret: String,
    // Lifetime of issued tokens.
    pub token_ttl: Duration,
    // Where protected routes look for the token.
    pub token_source: TokenSource,
    // Fallback tracing filter when RUST_LOG is not set.
    pub log_level: String,
}

/// Env
///
/// Defines the runtime context. Production demands explicit secrets and emits JSON logs;
/// local development tolerates fallbacks and pretty-prints.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// TokenSource
///
/// The single location a token is read from on protected routes. Exactly one is active
/// per deployment; a token presented through the other channel is ignored.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenSource {
    /// `Authorization: Bearer <token>`.
    Bearer,
    /// The `jwt` cookie set at signin.
    Cookie,
}

impl FromStr for TokenSource {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bearer" | "header" => Ok(TokenSource::Bearer),
            "cookie" => Ok(TokenSource::Cookie),
            other => Err(ConfigError::Invalid {
                key: "AUTH_TOKEN_SOURCE",
                value: other.to_string(),
            }),
        }
    }
}

/// Reasons `AppConfig::load` refuses to produce a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

impl Default for AppConfig {
    /// Safe, non-panicking configuration for tests and state scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            host: "127.0.0.1".to_string(),
            port: 3000,
            db_url: None,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
            token_source: TokenSource::Bearer,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from the environment. Production fails fast when the
    /// database URL or signing secret is absent; local mode falls back to the
    /// in-memory store and a development secret.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").unwrap_or_default().as_str() {
            "production" | "prod" => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match (env, env::var("JWT_SECRET").ok()) {
            (_, Some(secret)) if !secret.is_empty() => secret,
            (Env::Production, _) => return Err(ConfigError::Missing("JWT_SECRET")),
            (Env::Local, _) => LOCAL_JWT_SECRET.to_string(),
        };

        let db_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        if env == Env::Production && db_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let port = parse_var("PORT", 3000u16)?;
        let ttl_secs = parse_var("JWT_TTL_SECS", DEFAULT_TOKEN_TTL_SECS)?;
        if !(1..=MAX_TOKEN_TTL_SECS).contains(&ttl_secs) {
            return Err(ConfigError::Invalid {
                key: "JWT_TTL_SECS",
                value: ttl_secs.to_string(),
            });
        }
        let token_ttl = Duration::from_secs(ttl_secs);
        let token_source = match env::var("AUTH_TOKEN_SOURCE") {
            Ok(raw) => raw.parse()?,
            Err(_) => TokenSource::Bearer,
        };

        Ok(Self {
            env,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            db_url,
            jwt_secret,
            token_ttl,
            token_source,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// The `host:port` pair handed to the TCP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}
