use clap::{Args, Parser, ValueEnum};

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub auth: AuthConfig,

    #[command(flatten)]
    pub rate_limit: RateLimitConfig,

    #[command(flatten)]
    pub health: HealthConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[arg(long = "database-url", env = "TODO_DATABASE_URL", default_value = "sqlite://todo.db?mode=rwc")]
    pub url: String,

    /// Maximum number of pooled connections
    #[arg(long = "db-max-connections", env = "TODO_DB_MAX_CONNECTIONS", default_value_t = 8)]
    pub max_connections: u32,

    /// How long a request may wait for a pooled connection
    #[arg(long = "db-acquire-timeout-secs", env = "TODO_DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub acquire_timeout_secs: u64,

    /// How long SQLite waits on a locked database before failing
    #[arg(long = "db-busy-timeout-ms", env = "TODO_DB_BUSY_TIMEOUT_MS", default_value_t = 5000)]
    pub busy_timeout_ms: u64,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "TODO_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "TODO_PORT", default_value_t = 4000)]
    pub port: u16,

    /// Port for the management (health) server
    #[arg(long, env = "TODO_MGMT_PORT", default_value_t = 4001)]
    pub mgmt_port: u16,

    /// Upper bound on the time spent handling a single request
    #[arg(long, env = "TODO_REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// How long to wait for background tasks during shutdown
    #[arg(long, env = "TODO_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct AuthConfig {
    /// Secret key for access token signing
    #[arg(long, env = "TODO_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Access token time-to-live in seconds
    #[arg(long, env = "TODO_ACCESS_TOKEN_TTL_SECS", default_value_t = 900)]
    pub access_token_ttl_secs: u64,

    /// Refresh token time-to-live in days
    #[arg(long, env = "TODO_REFRESH_TOKEN_TTL_DAYS", default_value_t = 30)]
    pub refresh_token_ttl_days: i64,

    /// How often to purge expired refresh tokens (0 disables)
    #[arg(long, env = "TODO_REFRESH_TOKEN_CLEANUP_INTERVAL_SECS", default_value_t = 3600)]
    pub cleanup_interval_secs: u64,

    /// Argon2 memory cost in KiB
    #[arg(long, env = "TODO_PASSWORD_MEMORY_KIB", default_value_t = 19_456)]
    pub password_memory_kib: u32,

    /// Argon2 iteration count
    #[arg(long, env = "TODO_PASSWORD_ITERATIONS", default_value_t = 2)]
    pub password_iterations: u32,

    /// Argon2 degree of parallelism
    #[arg(long, env = "TODO_PASSWORD_PARALLELISM", default_value_t = 1)]
    pub password_parallelism: u32,
}

#[derive(Clone, Debug, Args)]
pub struct RateLimitConfig {
    /// Requests per second allowed per client on the auth endpoints
    #[arg(long, env = "TODO_AUTH_RATE_LIMIT_PER_SECOND", default_value_t = 2)]
    pub auth_per_second: u32,

    /// Burst allowance on the auth endpoints
    #[arg(long, env = "TODO_AUTH_RATE_LIMIT_BURST", default_value_t = 10)]
    pub auth_burst: u32,
}

#[derive(Clone, Debug, Args)]
pub struct HealthConfig {
    /// Timeout for the database readiness check
    #[arg(long, env = "TODO_HEALTH_DB_TIMEOUT_MS", default_value_t = 2000)]
    pub db_timeout_ms: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "TODO_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP/HTTP collector endpoint; telemetry export is off when unset
    #[arg(long, env = "TODO_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

/// Upper bound on the access token lifetime, one day.
pub const MAX_ACCESS_TOKEN_TTL_SECS: u64 = 86_400;

/// Upper bound on the refresh token lifetime, ten years.
pub const MAX_REFRESH_TOKEN_TTL_DAYS: i64 = 3650;

impl AuthConfig {
    /// Rejects token lifetimes that are negative or too large to add to a timestamp.
    ///
    /// # Errors
    /// Returns an error naming the offending setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.access_token_ttl_secs == 0 || self.access_token_ttl_secs > MAX_ACCESS_TOKEN_TTL_SECS {
            anyhow::bail!(
                "access token TTL must be between 1 and {MAX_ACCESS_TOKEN_TTL_SECS} seconds, got {}",
                self.access_token_ttl_secs
            );
        }
        if !(0..=MAX_REFRESH_TOKEN_TTL_DAYS).contains(&self.refresh_token_ttl_days) {
            anyhow::bail!(
                "refresh token TTL must be between 0 and {MAX_REFRESH_TOKEN_TTL_DAYS} days, got {}",
                self.refresh_token_ttl_days
            );
        }
        Ok(())
    }
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
impl AuthConfig {
    pub(crate) fn for_tests() -> Self {
        Self {
            jwt_secret: "test_secret".to_string(),
            access_token_ttl_secs: 900,
            refresh_token_ttl_days: 7,
            cleanup_interval_secs: 0,
            password_memory_kib: 1024,
            password_iterations: 1,
            password_parallelism: 1,
        }
    }
}
