//! Core abstractions for agent-rs workflows
//!
//! This crate defines the seam between the workflow engine and the agents it
//! drives: the [`AgentProvider`] trait, the run-scoped [`ExecutionContext`],
//! and the shared error types.

pub mod context;
pub mod error;
pub mod provider;
pub mod registry;

pub use context::ExecutionContext;
pub use error::{Error, ProviderError, Result};
pub use provider::{AgentProvider, ResultShape, TaskOutput, TaskRequest};
pub use registry::ProviderRegistry;
