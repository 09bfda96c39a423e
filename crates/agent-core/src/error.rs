//! Error types for agent-core

use thiserror::Error;

/// Result type alias for agent-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for core operations
#[derive(Error, Debug)]
pub enum Error {
    /// A value could not be converted to or from its JSON form
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// No agent provider is registered under the requested name
    #[error("Unknown agent provider '{name}' (available: {available})")]
    UnknownProvider { name: String, available: String },
}

/// Failure raised by an agent provider while running a single task
///
/// These errors are task-local: the workflow engine records them on the
/// task's execution record and never lets them escape a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider did not answer in time
    #[error("Provider timed out after {0}s")]
    Timeout(u64),

    /// The upstream service rejected the call because of rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// The provider answered, but not in the requested result shape
    #[error("Malformed output: {0}")]
    MalformedOutput(String),

    /// The prompt for the task could not be rendered
    #[error("Prompt rendering failed: {0}")]
    Prompt(String),

    /// Any other provider failure
    #[error("Provider failure: {0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::Timeout(30);
        assert_eq!(err.to_string(), "Provider timed out after 30s");

        let err = Error::UnknownProvider {
            name: "ollama".to_string(),
            available: "anthropic, openai".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown agent provider 'ollama' (available: anthropic, openai)"
        );
    }
}
