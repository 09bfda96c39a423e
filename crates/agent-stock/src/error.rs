//! Error types for stock analysis operations

use agent_workflow::WorkflowError;
use thiserror::Error;

/// Stock analysis specific errors
#[derive(Debug, Error)]
pub enum StockError {
    /// No ticker could be found in the query
    #[error(
        "Could not detect a stock ticker in the query. Mention a symbol such as AAPL or $MSFT, or pass the ticker explicitly."
    )]
    TickerNotDetected,

    /// A caller-supplied ticker is not a valid symbol
    #[error("Invalid ticker: {0}")]
    InvalidTicker(String),

    /// Workflow construction or execution error
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for stock operations
pub type Result<T> = std::result::Result<T, StockError>;

/// Convert agent_core::Error to StockError
impl From<agent_core::Error> for StockError {
    fn from(err: agent_core::Error) -> Self {
        StockError::Workflow(WorkflowError::from(err))
    }
}

/// Convert agent_utils::ConfigError to StockError
impl From<agent_utils::ConfigError> for StockError {
    fn from(err: agent_utils::ConfigError) -> Self {
        StockError::Config(err.to_string())
    }
}
