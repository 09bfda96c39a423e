//! Configuration management utilities

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration could not be parsed
    #[error("Failed to parse YAML{}: {detail}", .path.as_ref().map(|p| format!(" in '{p}'")).unwrap_or_default())]
    Parse { path: Option<String>, detail: String },

    /// A configuration value is out of range
    #[error("Invalid configuration value for {key}: {detail}")]
    Invalid { key: String, detail: String },
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Invalid {
                key: "log_format".to_string(),
                detail: format!("expected 'text' or 'json', got '{other}'"),
            }),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (dev, prod, etc.)
    pub environment: String,
    /// Default log level when `RUST_LOG` is not set
    pub log_level: String,
    /// Log line format
    pub log_format: LogFormat,
    /// Workflow definitions file, if not using the built-in workflows
    pub workflows_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "agent-rs".to_string(),
            environment: "development".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            workflows_path: None,
        }
    }
}

impl Config {
    /// Environment variable for the environment name
    pub const ENV_ENVIRONMENT: &'static str = "AGENT_ENV";
    /// Environment variable for the default log level
    pub const ENV_LOG_LEVEL: &'static str = "AGENT_LOG_LEVEL";
    /// Environment variable for the log format
    pub const ENV_LOG_FORMAT: &'static str = "AGENT_LOG_FORMAT";
    /// Environment variable for the workflow definitions file
    pub const ENV_WORKFLOWS_PATH: &'static str = "AGENT_WORKFLOWS_PATH";

    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(env) = lookup(Self::ENV_ENVIRONMENT) {
            config.environment = env;
        }
        if let Some(level) = lookup(Self::ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(format) = lookup(Self::ENV_LOG_FORMAT) {
            config.log_format = format.parse()?;
        }
        if let Some(path) = lookup(Self::ENV_WORKFLOWS_PATH) {
            config.workflows_path = Some(PathBuf::from(path));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.workflows_path.is_none());
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("AGENT_LOG_LEVEL", "debug"),
            ("AGENT_LOG_FORMAT", "JSON"),
            ("AGENT_WORKFLOWS_PATH", "/etc/agent/workflows.yaml"),
        ]);

        let config = Config::from_lookup(|k| vars.get(k).map(|v| (*v).to_string())).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.workflows_path,
            Some(PathBuf::from("/etc/agent/workflows.yaml"))
        );
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn test_invalid_log_format() {
        let result = Config::from_lookup(|k| (k == "AGENT_LOG_FORMAT").then(|| "xml".to_string()));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
