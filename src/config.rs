//! Application configuration
//!
//! Loaded from a TOML file. Every section and field has a default, so an
//! empty or missing file yields a working local setup (SQLite, fixed
//! signal providers).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::IsolationLevel;
use crate::infrastructure::DatabaseConfig;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "BIKERENTAL_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub logging: LoggingConfig,
    pub reservations: ReservationsConfig,
    pub signals: SignalsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub backend: StorageBackend,
    /// Connection URL; for SQLite a bare path is accepted too
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            url: "sqlite://./bike-rental.db?mode=rwc".to_string(),
            max_connections: 10,
        }
    }
}

impl DatabaseSection {
    pub fn connection_url(&self) -> String {
        match self.backend {
            StorageBackend::Sqlite if !self.url.starts_with("sqlite:") => {
                format!("sqlite://{}?mode=rwc", self.url)
            }
            _ => self.url.clone(),
        }
    }

    /// `None` for the in-memory backend.
    pub fn database_config(&self) -> Option<DatabaseConfig> {
        match self.backend {
            StorageBackend::Memory => None,
            _ => Some(DatabaseConfig {
                url: self.connection_url(),
                max_connections: self.max_connections,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservationsConfig {
    /// `read-committed`, `repeatable-read` or `serializable`
    pub isolation: String,
    pub request_timeout_ms: u64,
}

impl Default for ReservationsConfig {
    fn default() -> Self {
        Self {
            isolation: "serializable".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

impl ReservationsConfig {
    pub fn isolation_level(&self) -> Result<IsolationLevel, ConfigError> {
        self.isolation
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown isolation level '{}'", self.isolation)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalsConfig {
    /// Base URL of the weather service; fixed answers when unset
    pub weather_url: Option<String>,
    /// Base URL of the incident history service; fixed answers when unset
    pub incidents_url: Option<String>,
    pub timeout_ms: u64,
    /// Answer of the fixed weather provider, `None` means no signal
    pub default_temperature: Option<f64>,
    /// Answer of the fixed incident provider, `None` means no signal
    pub default_incidents: Option<u32>,
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            weather_url: None,
            incidents_url: None,
            timeout_ms: 2_000,
            default_temperature: None,
            default_incidents: None,
        }
    }
}

impl SignalsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl AppConfig {
    /// Read and validate `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&raw).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.api_host.trim().is_empty() {
            return Err(ConfigError::Invalid("server.api_host is empty".into()));
        }
        if self.database.backend != StorageBackend::Memory && self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url is empty".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".into(),
            ));
        }
        match self.logging.format.to_lowercase().as_str() {
            "text" | "json" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "logging.format must be 'text' or 'json', got '{other}'"
                )))
            }
        }
        self.reservations.isolation_level()?;
        if self.reservations.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "reservations.request_timeout_ms must be positive".into(),
            ));
        }
        if self.signals.timeout_ms == 0 {
            return Err(ConfigError::Invalid("signals.timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn api_address(&self) -> String {
        format!("{}:{}", self.server.api_host, self.server.api_port)
    }
}

/// `$BIKERENTAL_CONFIG`, else `<config dir>/bike-rental/config.toml`.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bike-rental")
        .join("config.toml")
}
