//! Dependency-graph workflow execution for agent-rs
//!
//! This crate turns a per-agent workflow configuration into a dependency
//! graph, levels it into waves, and executes each wave concurrently against
//! an [`agent_core::AgentProvider`]. Failures prune dependents instead of
//! aborting the run, and every run produces a bounded execution trace.

pub mod config;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod execution;
pub mod graph;
pub mod prompt;
pub mod scheduler;
pub mod trace;
pub mod workflow;

// Re-export for convenience
pub use config::{AgentConfig, DEFAULT_SYNTHESIS_ROLE, WorkflowCatalog, WorkflowConfig};
pub use descriptor::{TaskDescriptor, TaskRegistry};
pub use engine::{ExecutionEngine, RunOptions, RunReport};
pub use error::{Result, WorkflowError};
pub use execution::{ExecutionMap, TaskExecution, TaskStatus};
pub use graph::{DependencyGraph, Edge};
pub use prompt::{PromptRenderer, default_template};
pub use scheduler::{LevelPlan, compute_levels};
pub use trace::{DEFAULT_PREVIEW_LEN, TraceNode, TraceRecord, build_trace};
pub use workflow::Workflow;
