//! Configuration for stock analysis operations

use crate::error::{Result, StockError};
use agent_workflow::DEFAULT_PREVIEW_LEN;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Name of the workflow run by default
pub const DEFAULT_WORKFLOW: &str = "investment_analysis";

/// Configuration for the investment analysis service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockConfig {
    /// Workflow to run for each query
    pub workflow_name: String,

    /// Maximum length of trace previews, in characters
    pub preview_len: usize,

    /// Overall time budget; overrides the workflow's own `timeout_secs`
    pub timeout: Option<Duration>,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            workflow_name: DEFAULT_WORKFLOW.to_string(),
            preview_len: DEFAULT_PREVIEW_LEN,
            timeout: None,
        }
    }
}

impl StockConfig {
    /// Create a new configuration builder
    pub fn builder() -> StockConfigBuilder {
        StockConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.workflow_name.trim().is_empty() {
            return Err(StockError::Config(
                "workflow_name must not be empty".to_string(),
            ));
        }

        if self.preview_len == 0 {
            return Err(StockError::Config(
                "preview_len must be greater than 0".to_string(),
            ));
        }

        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(StockError::Config(
                "timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for StockConfig
#[derive(Debug, Default)]
pub struct StockConfigBuilder {
    workflow_name: Option<String>,
    preview_len: Option<usize>,
    timeout: Option<Duration>,
}

impl StockConfigBuilder {
    /// Set the workflow to run
    pub fn workflow_name(mut self, name: impl Into<String>) -> Self {
        self.workflow_name = Some(name.into());
        self
    }

    /// Set the trace preview length
    pub fn preview_len(mut self, len: usize) -> Self {
        self.preview_len = Some(len);
        self
    }

    /// Set the overall time budget
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<StockConfig> {
        let defaults = StockConfig::default();

        let config = StockConfig {
            workflow_name: self.workflow_name.unwrap_or(defaults.workflow_name),
            preview_len: self.preview_len.unwrap_or(defaults.preview_len),
            timeout: self.timeout.or(defaults.timeout),
        };

        config.validate()?;
        Ok(config)
    }
}
