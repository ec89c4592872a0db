//! `[log]` section
//!
//! The connector logs under the `snowflake_export` target. HTTP and TLS
//! dependencies are noisy at `debug`, so they get their own, quieter level.
//!
//! ```toml
//! [log]
//! level = "debug"
//! dependency_level = "warn"
//! format = "json"
//! ```

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use super::error::ConfigError;

/// Log target shared by the library and the CLI
pub const LOG_TARGET: &str = "snowflake_export";

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(ConfigError::invalid_value(
                "log",
                "level",
                format!("expected trace, debug, info, warn or error, got '{}'", other),
            )),
        }
    }
}

/// Where log lines go and in what shape
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Console,
    /// One JSON object per line, for log shippers
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level for connector targets
    pub level: LogLevel,

    /// Level for every other target (reqwest, hyper, rustls)
    pub dependency_level: LogLevel,

    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            dependency_level: LogLevel::Warn,
            format: LogFormat::Console,
        }
    }
}

impl LogConfig {
    /// `EnvFilter` directive for these settings, with `level` overriding the
    /// configured connector level
    pub fn directive(&self, level: Option<LogLevel>) -> String {
        format!(
            "{},{}={}",
            self.dependency_level,
            LOG_TARGET,
            level.unwrap_or(self.level)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_quiet_dependencies() {
        let config: LogConfig = toml::from_str("").unwrap();
        assert_eq!(config.format, LogFormat::Console);
        assert_eq!(config.directive(None), "warn,snowflake_export=info");
    }

    #[test]
    fn test_override_replaces_connector_level_only() {
        let config: LogConfig =
            toml::from_str("level = \"warn\"\ndependency_level = \"error\"\nformat = \"json\"")
                .unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(
            config.directive(Some(LogLevel::Trace)),
            "error,snowflake_export=trace"
        );
    }

    #[test]
    fn test_parse_level() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!(matches!(
            "loud".parse::<LogLevel>(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_unknown_level_in_file_is_rejected() {
        assert!(toml::from_str::<LogConfig>("level = \"loud\"").is_err());
    }
}
