//! Session and logging configuration.
//!
//! # Responsibility
//! - Define the knobs a `Desk` session honors.
//! - Resolve logging settings from the process environment.
//!
//! # Invariants
//! - Every field has a default; an empty JSON object is a valid `DeskConfig`.
//! - Unknown JSON fields are rejected so typos surface early.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Environment variable naming the log level.
pub const LOG_LEVEL_ENV: &str = "BAGDESK_LOG_LEVEL";
/// Environment variable naming the absolute log directory.
pub const LOG_DIR_ENV: &str = "BAGDESK_LOG_DIR";

/// Behavior switches for one desk session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeskConfig {
    /// Validate insert/remove/invert preconditions and report violations.
    ///
    /// When `false`, operands are trusted and a violation leaves nested
    /// totals inconsistent. Stale handles and self-insertion are rejected
    /// either way.
    pub precondition_checks: bool,
    /// Recount every aggregate by traversal after each mutation and log
    /// mismatches. Linear cost; meant for debugging.
    pub audit_after_mutation: bool,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            precondition_checks: true,
            audit_after_mutation: false,
        }
    }
}

impl DeskConfig {
    /// Trusted mode: no precondition validation.
    pub fn trusted() -> Self {
        Self {
            precondition_checks: false,
            ..Self::default()
        }
    }

    /// Parses a config from a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(ConfigError::Parse)
    }
}

/// Logging settings resolved before `init_logging`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute directory for rolling log files. `None` disables logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl LoggingConfig {
    /// Reads `BAGDESK_LOG_LEVEL` and `BAGDESK_LOG_DIR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let level = lookup(LOG_LEVEL_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| default_log_level().to_string());
        let log_dir = lookup(LOG_DIR_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self { level, log_dir }
    }

    /// Whether a log directory was configured.
    pub fn is_enabled(&self) -> bool {
        self.log_dir.is_some()
    }
}

/// Errors from configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid desk config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DeskConfig, LoggingConfig, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use crate::logging::default_log_level;
    use std::path::PathBuf;

    #[test]
    fn default_config_checks_preconditions() {
        let config = DeskConfig::default();
        assert!(config.precondition_checks);
        assert!(!config.audit_after_mutation);
        assert!(!DeskConfig::trusted().precondition_checks);
    }

    #[test]
    fn empty_json_object_yields_defaults() {
        let config = DeskConfig::from_json_str("{}").unwrap();
        assert_eq!(config, DeskConfig::default());
    }

    #[test]
    fn json_overrides_individual_fields() {
        let config = DeskConfig::from_json_str(r#"{ "audit_after_mutation": true }"#).unwrap();
        assert!(config.precondition_checks);
        assert!(config.audit_after_mutation);
    }

    #[test]
    fn unknown_json_field_is_rejected() {
        let err = DeskConfig::from_json_str(r#"{ "precondition_check": false }"#).unwrap_err();
        assert!(err.to_string().contains("invalid desk config"));
    }

    #[test]
    fn logging_config_falls_back_to_build_default() {
        let config = LoggingConfig::from_lookup(|_| None);
        assert_eq!(config.level, default_log_level());
        assert!(!config.is_enabled());
    }

    #[test]
    fn logging_config_reads_trimmed_values() {
        let config = LoggingConfig::from_lookup(|key| match key {
            LOG_LEVEL_ENV => Some(" warn ".to_string()),
            LOG_DIR_ENV => Some("/var/log/bagdesk".to_string()),
            _ => None,
        });
        assert_eq!(config.level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/bagdesk")));
    }
}
