//! Configuration
//!
//! TOML configuration for the connector and its command-line driver.
//!
//! ```toml
//! [connector]
//! sync_interval_ms = 60000
//! flush_threshold = 50
//!
//! [log]
//! level = "info"
//!
//! [connections.prod]
//! Host = "acme.snowflakecomputing.com"
//! Username = "exporter"
//! Password = "..."
//! DatabaseName = "ANALYTICS"
//! Schema = "PUBLIC"
//! ```

mod error;
mod logging;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use uuid::Uuid;

pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};

use crate::connection::ConnectionConfig;
use crate::error::ConnectorError;
use crate::host::{AuthenticationMap, StaticAuthentication};
use crate::snowflake::SnowflakeClientConfig;

/// Connector behaviour settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConnectorSettings {
    /// Interval between timer-driven syncs in milliseconds
    /// Default: 60000
    pub sync_interval_ms: u64,

    /// Buffered record count that triggers an immediate flush
    /// Default: 50
    pub flush_threshold: usize,

    /// Upper bound for one statement in seconds
    /// Default: 300
    pub query_timeout_secs: u64,

    /// Login request timeout in seconds
    /// Default: 60
    pub login_timeout_secs: u64,

    /// URL scheme for warehouse endpoints
    /// Default: https
    pub scheme: String,
}

impl Default for ConnectorSettings {
    fn default() -> Self {
        Self {
            sync_interval_ms: 60_000,
            flush_threshold: 50,
            query_timeout_secs: 300,
            login_timeout_secs: 60,
            scheme: "https".to_string(),
        }
    }
}

impl ConnectorSettings {
    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }

    /// Warehouse client settings derived from these
    pub fn client_config(&self) -> SnowflakeClientConfig {
        SnowflakeClientConfig {
            scheme: self.scheme.clone(),
            login_timeout: Duration::from_secs(self.login_timeout_secs),
            query_timeout: Duration::from_secs(self.query_timeout_secs),
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.flush_threshold == 0 {
            return Err(ConfigError::invalid_value(
                "connector",
                "flush_threshold",
                "must be greater than zero",
            ));
        }
        if self.sync_interval_ms == 0 {
            return Err(ConfigError::invalid_value(
                "connector",
                "sync_interval_ms",
                "must be greater than zero",
            ));
        }
        if self.query_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "connector",
                "query_timeout_secs",
                "must be greater than zero",
            ));
        }
        if !matches!(self.scheme.as_str(), "http" | "https") {
            return Err(ConfigError::invalid_value(
                "connector",
                "scheme",
                format!("expected http or https, got '{}'", self.scheme),
            ));
        }
        Ok(())
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Connector behaviour
    pub connector: ConnectorSettings,

    /// Logging configuration
    pub log: LogConfig,

    /// Named authentication maps, keyed by connection name
    pub connections: BTreeMap<String, AuthenticationMap>,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, contains invalid TOML, or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.connector.validate()?;

        for (name, details) in &self.connections {
            match ConnectionConfig::for_connection(details) {
                Ok(_) => {}
                Err(ConnectorError::MissingAuthKey(key)) => {
                    return Err(ConfigError::missing_key(name, key));
                }
                Err(e) => {
                    return Err(ConfigError::invalid_value(
                        "connections",
                        "details",
                        format!("{}: {}", name, e),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Authentication map for a named connection
    pub fn connection(&self, name: &str) -> Result<&AuthenticationMap> {
        self.connections
            .get(name)
            .ok_or_else(|| ConfigError::UnknownConnection(name.to_string()))
    }

    /// Register every configured connection with a fresh id.
    ///
    /// Returns the provider and the id assigned to each connection name.
    pub fn authentication(&self) -> (StaticAuthentication, BTreeMap<String, Uuid>) {
        let mut provider = StaticAuthentication::new();
        let mut ids = BTreeMap::new();
        for (name, details) in &self.connections {
            let id = Uuid::new_v4();
            provider.insert(id, details.clone());
            ids.insert(name.clone(), id);
        }
        (provider, ids)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
