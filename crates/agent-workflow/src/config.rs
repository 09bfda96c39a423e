//! Workflow configuration
//!
//! Workflows are declared in YAML. Each workflow lists its agents (one per
//! role) together with their dependencies, tools, and instructions.
//!
//! # Example
//!
//! ```yaml
//! workflows:
//!   investment_analysis:
//!     synthesis_role: synthesis
//!     timeout_secs: 300
//!     agents:
//!       - role: market_analysis
//!         result_shape: market_analysis
//!         instructions: Analyze the market position of the stock.
//!       - role: synthesis
//!         dependencies: [market_analysis]
//!         result_shape: investment_analysis
//!         instructions: Write the final investment report.
//! ```

use crate::error::{Result, WorkflowError};
use agent_core::ResultShape;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Default role name of the terminal synthesis task
pub const DEFAULT_SYNTHESIS_ROLE: &str = "synthesis";

fn default_true() -> bool {
    true
}

fn default_synthesis_role() -> String {
    DEFAULT_SYNTHESIS_ROLE.to_string()
}

/// Configuration of one agent (one role) in a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Unique role name; must be a lowercase identifier
    pub role: String,

    /// Whether the workflow's success depends on this role
    #[serde(default = "default_true")]
    pub required: bool,

    /// Disabled roles are not created; dependencies on them are dropped
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Roles that must complete before this one runs
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Tools the agent may call
    #[serde(default)]
    pub tools: Vec<String>,

    /// Role instructions
    #[serde(default)]
    pub instructions: String,

    /// Prompt template; generated from the instructions when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Schema of the role's output
    #[serde(default)]
    pub result_shape: ResultShape,

    /// Model override for this role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Placeholder text used when this role's output is missing from the report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

impl AgentConfig {
    /// Create a minimal agent configuration for a role
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            required: true,
            enabled: true,
            dependencies: Vec::new(),
            tools: Vec::new(),
            instructions: String::new(),
            prompt: None,
            result_shape: ResultShape::Untyped,
            model: None,
            fallback: None,
        }
    }

    /// Set the dependencies
    pub fn depends_on<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Set the instructions
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Set an explicit prompt template
    pub fn prompt(mut self, template: impl Into<String>) -> Self {
        self.prompt = Some(template.into());
        self
    }

    /// Set the result shape
    pub fn result_shape(mut self, shape: ResultShape) -> Self {
        self.result_shape = shape;
        self
    }

    /// Mark the role as optional
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set the tools
    pub fn tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }
}

/// Configuration of one workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Role whose output is the final report
    #[serde(default = "default_synthesis_role")]
    pub synthesis_role: String,

    /// Overall time budget, checked between levels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Agents in declaration order
    pub agents: Vec<AgentConfig>,
}

impl WorkflowConfig {
    /// Create a workflow configuration from a list of agents
    pub fn new(agents: Vec<AgentConfig>) -> Self {
        Self {
            description: String::new(),
            synthesis_role: default_synthesis_role(),
            timeout_secs: None,
            agents,
        }
    }

    /// The configured time budget
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// A set of named workflows loaded from one YAML document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowCatalog {
    /// Workflows by name
    #[serde(default)]
    pub workflows: BTreeMap<String, WorkflowConfig>,
}

impl WorkflowCatalog {
    /// Parse a catalog from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(agent_utils::parse_yaml(yaml)?)
    }

    /// Load a catalog from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(agent_utils::load_yaml_file(path)?)
    }

    /// Look up a workflow by name
    pub fn get_workflow_config(&self, workflow_name: &str) -> Result<&WorkflowConfig> {
        self.workflows.get(workflow_name).ok_or_else(|| {
            WorkflowError::Configuration(format!(
                "Unknown workflow '{workflow_name}' (available: {})",
                self.names().join(", ")
            ))
        })
    }

    /// Names of all workflows, sorted
    pub fn names(&self) -> Vec<&str> {
        self.workflows.keys().map(String::as_str).collect()
    }
}
