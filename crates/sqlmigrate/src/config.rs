//! Facade configuration.

use crate::error::MigrationResult;
use serde::Deserialize;

/// Level at which statements are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    #[default]
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Configuration for [`Migration`](crate::Migration).
///
/// Can be built in code or loaded from TOML:
///
/// ```toml
/// log_statements = true
/// log_level = "info"
/// max_sql_length = 500
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Emit a `tracing` event for every statement before it runs.
    pub log_statements: bool,
    /// Event level for statement logs.
    pub log_level: LogLevel,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            log_statements: true,
            log_level: LogLevel::Debug,
            max_sql_length: Some(200),
        }
    }
}

impl MigrationConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML; missing keys take their defaults.
    pub fn from_toml_str(raw: &str) -> MigrationResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Enable or disable statement logging.
    pub fn log_statements(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }

    /// Set the statement log level.
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MigrationConfig::new();
        assert!(config.log_statements);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.max_sql_length, Some(200));
    }

    #[test]
    fn builder_methods() {
        let config = MigrationConfig::new()
            .log_statements(false)
            .log_level(LogLevel::Info)
            .no_truncate();
        assert!(!config.log_statements);
        assert_eq!(tracing::Level::from(config.log_level), tracing::Level::INFO);
        assert_eq!(config.max_sql_length, None);
    }

    #[test]
    fn from_toml_with_partial_keys() {
        let config = MigrationConfig::from_toml_str("log_level = \"trace\"\nmax_sql_length = 50\n")
            .unwrap();
        assert!(config.log_statements);
        assert_eq!(config.log_level, LogLevel::Trace);
        assert_eq!(config.max_sql_length, Some(50));
    }

    #[test]
    fn from_toml_empty_is_default() {
        assert_eq!(
            MigrationConfig::from_toml_str("").unwrap(),
            MigrationConfig::default()
        );
    }

    #[test]
    fn from_toml_rejects_unknown_level() {
        let err = MigrationConfig::from_toml_str("log_level = \"loud\"").unwrap_err();
        assert!(matches!(err, crate::MigrationError::Config(_)));
    }
}
