//! Application configuration.

use serde::Deserialize;
use std::path::Path;

use crate::error::AppError;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ticket and access-code credential configuration.
    #[serde(default)]
    pub credentials: CredentialConfig,
    /// Rate limiting configuration.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. `*` allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Access-code strength policy.
///
/// `Numeric` is only acceptable when the authorization gate is rate limited;
/// [`Config::validate`] rejects it otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CodePolicy {
    /// Long code over letters and digits.
    #[default]
    Alphanumeric,
    /// Short digit-only code. Requires rate limiting to be enabled.
    Numeric,
}

/// Ticket and access-code configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialConfig {
    /// Length of the public ticket identifier.
    #[serde(default = "default_ticket_length")]
    pub ticket_length: usize,
    /// Access-code strength policy.
    #[serde(default)]
    pub code_policy: CodePolicy,
    /// Length of the secret access code.
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    /// Argon2id parameters for code hashing.
    #[serde(default)]
    pub argon2: Argon2Config,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            ticket_length: default_ticket_length(),
            code_policy: CodePolicy::default(),
            code_length: default_code_length(),
            argon2: Argon2Config::default(),
        }
    }
}

/// Argon2id cost parameters.
///
/// Tunable without a schema change; the chosen parameters are embedded in
/// each stored PHC hash string.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Argon2Config {
    /// Memory cost in KiB.
    #[serde(default = "default_argon2_memory_kib")]
    pub memory_kib: u32,
    /// Number of iterations.
    #[serde(default = "default_argon2_time_cost")]
    pub time_cost: u32,
    /// Degree of parallelism.
    #[serde(default = "default_argon2_parallelism")]
    pub parallelism: u32,
}

impl Default for Argon2Config {
    fn default() -> Self {
        Self {
            memory_kib: default_argon2_memory_kib(),
            time_cost: default_argon2_time_cost(),
            parallelism: default_argon2_parallelism(),
        }
    }
}

/// Rate limiting configuration for the API layer.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Maximum authorization attempts per window, per client.
    #[serde(default = "default_auth_max_attempts")]
    pub auth_max_attempts: u32,
    /// Authorization window duration in seconds.
    #[serde(default = "default_auth_window_secs")]
    pub auth_window_secs: u64,
    /// Maximum report creations per window, per client.
    #[serde(default = "default_create_max_requests")]
    pub create_max_requests: u32,
    /// Creation window duration in seconds.
    #[serde(default = "default_create_window_secs")]
    pub create_window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth_max_attempts: default_auth_max_attempts(),
            auth_window_secs: default_auth_window_secs(),
            create_max_requests: default_create_max_requests(),
            create_window_secs: default_create_window_secs(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_ticket_length() -> usize {
    8
}

const fn default_code_length() -> usize {
    24
}

const fn default_argon2_memory_kib() -> u32 {
    19456
}

const fn default_argon2_time_cost() -> u32 {
    2
}

const fn default_argon2_parallelism() -> u32 {
    1
}

const fn default_true() -> bool {
    true
}

const fn default_auth_max_attempts() -> u32 {
    10
}

const fn default_auth_window_secs() -> u64 {
    300
}

const fn default_create_max_requests() -> u32 {
    5
}

const fn default_create_window_secs() -> u64 {
    3600
}

/// Minimum ticket length; 32^8 keeps blind enumeration impractical.
pub const MIN_TICKET_LENGTH: usize = 8;

/// Minimum length for an alphanumeric access code.
pub const MIN_ALPHANUMERIC_CODE_LENGTH: usize = 16;

/// Minimum length for a numeric access code.
pub const MIN_NUMERIC_CODE_LENGTH: usize = 6;

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `TIPLINE_ENV`)
    /// 3. Environment variables with `TIPLINE_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("TIPLINE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("TIPLINE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("TIPLINE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Validate credential policy at startup.
    ///
    /// A short numeric access code is brute-forceable without a rate limit on
    /// the authorization gate, so that combination is rejected outright
    /// instead of being silently accepted.
    pub fn validate(&self) -> Result<(), AppError> {
        let creds = &self.credentials;

        if creds.ticket_length < MIN_TICKET_LENGTH {
            return Err(AppError::Config(format!(
                "credentials.ticket_length must be at least {MIN_TICKET_LENGTH}"
            )));
        }

        match creds.code_policy {
            CodePolicy::Alphanumeric => {
                if creds.code_length < MIN_ALPHANUMERIC_CODE_LENGTH {
                    return Err(AppError::Config(format!(
                        "credentials.code_length must be at least \
                         {MIN_ALPHANUMERIC_CODE_LENGTH} for the alphanumeric policy"
                    )));
                }
            }
            CodePolicy::Numeric => {
                if !self.rate_limit.enabled {
                    return Err(AppError::Config(
                        "credentials.code_policy = \"numeric\" requires rate_limit.enabled"
                            .to_string(),
                    ));
                }
                if creds.code_length < MIN_NUMERIC_CODE_LENGTH {
                    return Err(AppError::Config(format!(
                        "credentials.code_length must be at least \
                         {MIN_NUMERIC_CODE_LENGTH} for the numeric policy"
                    )));
                }
            }
        }

        if creds.argon2.memory_kib == 0
            || creds.argon2.time_cost == 0
            || creds.argon2.parallelism == 0
        {
            return Err(AppError::Config(
                "credentials.argon2 costs must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}
