//! Application-level configuration shared by all binaries

use serde::{Deserialize, Serialize};

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, one event per line
    #[default]
    Pretty,
    /// Structured JSON, one object per line
    Json,
}

impl LogFormat {
    /// Parse a format name, falling back to [`LogFormat::Pretty`]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (development, production, ...)
    pub environment: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "stock-newsletter".to_string(),
            environment: "development".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Build a config for `app_name` from `APP_ENV` and `LOG_FORMAT`
    pub fn from_env(app_name: impl Into<String>) -> Self {
        Self::from_lookup(app_name, |key| std::env::var(key).ok())
    }

    /// Build a config reading variables through `lookup`
    pub fn from_lookup<F>(app_name: impl Into<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            app_name: app_name.into(),
            environment: lookup("APP_ENV").unwrap_or(defaults.environment),
            log_format: lookup("LOG_FORMAT").map_or(defaults.log_format, |v| LogFormat::parse(&v)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_without_variables() {
        let config = Config::from_lookup("app", |_| None);
        assert_eq!(config.app_name, "app");
        assert_eq!(config.environment, "development");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_reads_variables() {
        let vars: HashMap<&str, &str> = [("APP_ENV", "production"), ("LOG_FORMAT", "JSON")]
            .into_iter()
            .collect();
        let config = Config::from_lookup("app", |k| vars.get(k).map(ToString::to_string));
        assert_eq!(config.environment, "production");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_log_format_is_pretty() {
        assert_eq!(LogFormat::parse("yaml"), LogFormat::Pretty);
    }
}
