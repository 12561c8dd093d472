use crate::error::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;

/// One week.
pub const MAX_EXCHANGE_RATE_TTL_SECS: u64 = 7 * 24 * 60 * 60;
pub const MAX_SESSION_TTL_DAYS: i64 = 365;
/// One day.
pub const MAX_ONLINE_WINDOW_SECS: i64 = 24 * 60 * 60;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub sync: SyncConfig,
    pub exchange_rate: ExchangeRateConfig,
    pub session: SessionConfig,
    pub log: LogConfig,
    /// Group name → the teams shown together, in display order.
    pub team_groups: BTreeMap<String, Vec<String>>,
}

impl Config {
    /// Rejects settings that would make the server misbehave at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_EXCHANGE_RATE_TTL_SECS).contains(&self.exchange_rate.ttl_secs) {
            return Err(ConfigError::ValidationError(format!(
                "exchange_rate.ttl_secs must be between 1 and {}",
                MAX_EXCHANGE_RATE_TTL_SECS
            )));
        }
        if !(1..=MAX_SESSION_TTL_DAYS).contains(&self.session.ttl_days) {
            return Err(ConfigError::ValidationError(format!(
                "session.ttl_days must be between 1 and {}",
                MAX_SESSION_TTL_DAYS
            )));
        }
        if !(1..=MAX_ONLINE_WINDOW_SECS).contains(&self.session.online_window_secs) {
            return Err(ConfigError::ValidationError(format!(
                "session.online_window_secs must be between 1 and {}",
                MAX_ONLINE_WINDOW_SECS
            )));
        }
        if self.exchange_rate.fallback_rate <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "exchange_rate.fallback_rate must be positive".to_string(),
            ));
        }
        if self.sync.interval_secs == Some(0) {
            return Err(ConfigError::ValidationError(
                "sync.interval_secs must be positive when set".to_string(),
            ));
        }
        if let Some((name, _)) = self.team_groups.iter().find(|(_, teams)| teams.is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "team group '{}' has no teams",
                name
            )));
        }
        Ok(())
    }
}

/// Where the HTTP API listens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Maximum accepted request body, in bytes.
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            body_limit: 1024 * 1024,
        }
    }
}

/// Connection pool settings. The URL itself comes from `DATABASE_URL`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

/// Spreadsheet sync settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub sheets_base_url: String,
    /// A1 range holding the metric rows, header excluded.
    pub range: String,
    /// When set, `serve` also runs the sync on this period.
    pub interval_secs: Option<u64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sheets_base_url: "https://sheets.googleapis.com".to_string(),
            range: "Data!A2:AC".to_string(),
            interval_secs: None,
        }
    }
}

/// USD→THB rate lookup and its cache.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExchangeRateConfig {
    pub base_url: String,
    pub ttl_secs: u64,
    /// Served, flagged as a fallback, whenever the live rate is unavailable.
    pub fallback_rate: Decimal,
}

impl Default for ExchangeRateConfig {
    fn default() -> Self {
        Self {
            base_url: "https://v6.exchangerate-api.com".to_string(),
            ttl_secs: 30 * 60,
            fallback_rate: dec!(36.5),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub ttl_days: i64,
    /// A user counts as online if their last heartbeat is this recent.
    pub online_window_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_days: 30,
            online_window_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive; `RUST_LOG` overrides it.
    pub level: String,
    /// Directory for daily-rolling log files. Stdout only when unset.
    pub directory: Option<String>,
    pub file_prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "adboard.log".to_string(),
        }
    }
}

/// Credentials read from the environment (usually a `.env` file).
#[derive(Clone, Default)]
pub struct Secrets {
    pub sync_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub google_sheet_id: Option<String>,
    pub exchange_rate_api_key: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            sync_api_key: var("SYNC_API_KEY"),
            google_api_key: var("GOOGLE_API_KEY"),
            google_sheet_id: var("GOOGLE_SHEET_ID"),
            exchange_rate_api_key: var("EXCHANGE_RATE_API_KEY"),
        }
    }

    pub fn require_google(&self) -> Result<(&str, &str), ConfigError> {
        let key = self
            .google_api_key
            .as_deref()
            .ok_or(ConfigError::MissingEnv("GOOGLE_API_KEY"))?;
        let sheet = self
            .google_sheet_id
            .as_deref()
            .ok_or(ConfigError::MissingEnv("GOOGLE_SHEET_ID"))?;
        Ok((key, sheet))
    }
}

// Secrets never show up in logs.
impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Secrets")
            .field("sync_api_key", &mask(&self.sync_api_key))
            .field("google_api_key", &mask(&self.google_api_key))
            .field("google_sheet_id", &mask(&self.google_sheet_id))
            .field("exchange_rate_api_key", &mask(&self.exchange_rate_api_key))
            .finish()
    }
}
