//! Error types for workflow construction and execution

use crate::execution::TaskStatus;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for agent-workflow
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Errors raised by workflow construction and execution
///
/// Task-level provider failures are not represented here: they are recorded
/// on the task's execution record instead of being raised.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// The workflow configuration cannot be used
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The workflow exceeded its time budget between levels
    #[error("Workflow timed out after {elapsed:?} (budget {budget:?})")]
    Timeout { elapsed: Duration, budget: Duration },

    /// A task execution record was moved through an illegal status change
    #[error("Invalid status transition for '{role}': {from} -> {to}")]
    InvalidTransition {
        role: String,
        from: TaskStatus,
        to: TaskStatus,
    },

    /// Error from agent-core
    #[error(transparent)]
    Core(#[from] agent_core::Error),
}

impl From<agent_utils::ConfigError> for WorkflowError {
    fn from(err: agent_utils::ConfigError) -> Self {
        WorkflowError::Configuration(err.to_string())
    }
}
