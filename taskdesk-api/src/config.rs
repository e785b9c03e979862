/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma separated allowed origins (default: *)
/// - `COOKIE_SECURE`: Mark the refresh cookie `Secure` (default: false)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 25)
/// - `JWT_SECRET`: Secret key for JWT signing (required)
/// - `JWT_ACCESS_EXPIRY_MIN`: Access token lifetime (default: 15, max: one year)
/// - `JWT_REFRESH_EXPIRY_DAYS`: Refresh token lifetime (default: 7, max: 3650)
/// - `SESSION_SWEEP_INTERVAL_HOURS`: Time between session sweeps (default: 24, max: 8760)
/// - `SESSION_SWEEP_TIMEOUT_SECS`: Upper bound for one sweep (default: 30, max: 3600)
/// - `SESSION_RETENTION_DAYS`: How long revoked sessions are kept (default: 30, max: 3650)
/// - `LOG_FORMAT`: `text` or `json` (default: text)
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use taskdesk_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use std::{env, fmt, str::FromStr, time::Duration};
use taskdesk_shared::auth::{
    jwt::{TokenConfig, MAX_ACCESS_TTL_MINUTES, MAX_REFRESH_TTL_DAYS},
    sweeper::SweeperConfig,
};
use taskdesk_shared::db::pool::PoolConfig;

/// Secrets shorter than this are accepted with a warning
const RECOMMENDED_SECRET_BYTES: usize = 32;

const MAX_SWEEP_INTERVAL_HOURS: u64 = 24 * 365;

const MAX_SWEEP_TIMEOUT_SECS: u64 = 60 * 60;

const MAX_RETENTION_DAYS: i64 = 3650;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub sessions: SessionConfig,
    pub log_format: LogFormat,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// `*` allows any origin
    pub cors_origins: Vec<String>,
    /// Adds `Secure` to the refresh token cookie
    pub cookie_secure: bool,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Should be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,
    pub access_expiry_minutes: i64,
    pub refresh_expiry_days: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_expiry_minutes", &self.access_expiry_minutes)
            .field("refresh_expiry_days", &self.refresh_expiry_days)
            .finish()
    }
}

/// Refresh session housekeeping
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub sweep_interval_hours: u64,
    pub sweep_timeout_secs: u64,
    pub retention_days: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("unknown log format '{}', expected 'text' or 'json'", other),
        }
    }
}

impl Config {
    /// Loads configuration from `.env` and the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` or `JWT_SECRET` is missing
    /// - `JWT_SECRET` is empty
    /// - a numeric variable does not parse or is outside its range
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "API_PORT", 8080u16)?;
        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        let cookie_secure = parse_or(&lookup, "COOKIE_SECURE", false)?;

        let database_url =
            lookup("DATABASE_URL").context("DATABASE_URL environment variable is required")?;
        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 25u32)?;

        let secret = lookup("JWT_SECRET").context("JWT_SECRET environment variable is required")?;
        if secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }
        if secret.len() < RECOMMENDED_SECRET_BYTES {
            tracing::warn!(
                length = secret.len(),
                "JWT_SECRET is shorter than {} bytes",
                RECOMMENDED_SECRET_BYTES
            );
        }

        let access_expiry_minutes = bounded(
            parse_or(&lookup, "JWT_ACCESS_EXPIRY_MIN", 15i64)?,
            MAX_ACCESS_TTL_MINUTES,
            "JWT_ACCESS_EXPIRY_MIN",
        )?;
        let refresh_expiry_days = bounded(
            parse_or(&lookup, "JWT_REFRESH_EXPIRY_DAYS", 7i64)?,
            MAX_REFRESH_TTL_DAYS,
            "JWT_REFRESH_EXPIRY_DAYS",
        )?;

        let sweep_interval_hours = bounded(
            parse_or(&lookup, "SESSION_SWEEP_INTERVAL_HOURS", 24u64)?,
            MAX_SWEEP_INTERVAL_HOURS,
            "SESSION_SWEEP_INTERVAL_HOURS",
        )?;
        let sweep_timeout_secs = bounded(
            parse_or(&lookup, "SESSION_SWEEP_TIMEOUT_SECS", 30u64)?,
            MAX_SWEEP_TIMEOUT_SECS,
            "SESSION_SWEEP_TIMEOUT_SECS",
        )?;
        let retention_days = bounded(
            parse_or(&lookup, "SESSION_RETENTION_DAYS", 30i64)?,
            MAX_RETENTION_DAYS,
            "SESSION_RETENTION_DAYS",
        )?;

        let log_format = lookup("LOG_FORMAT")
            .map(|value| value.parse::<LogFormat>())
            .transpose()?
            .unwrap_or(LogFormat::Text);

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                cookie_secure,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret,
                access_expiry_minutes,
                refresh_expiry_days,
            },
            sessions: SessionConfig {
                sweep_interval_hours,
                sweep_timeout_secs,
                retention_days,
            },
            log_format,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn token_config(&self) -> TokenConfig {
        let mut config = TokenConfig::new(self.jwt.secret.clone());
        config.access_ttl_minutes = self.jwt.access_expiry_minutes;
        config.refresh_ttl_days = self.jwt.refresh_expiry_days;
        config
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            ..Default::default()
        }
    }

    pub fn sweeper_config(&self) -> SweeperConfig {
        SweeperConfig {
            interval: Duration::from_secs(self.sessions.sweep_interval_hours * 60 * 60),
            timeout: Duration::from_secs(self.sessions.sweep_timeout_secs),
            retention: chrono::Duration::days(self.sessions.retention_days),
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}

/// Accepts `0 < value <= max`
fn bounded<T>(value: T, max: T, key: &str) -> anyhow::Result<T>
where
    T: PartialOrd + Default + fmt::Display,
{
    if value <= T::default() {
        anyhow::bail!("{} must be positive", key);
    }
    if value > max {
        anyhow::bail!("{} must be at most {}", key, max);
    }
    Ok(value)
}
