//! Task descriptors and the per-workflow registry
//!
//! A [`TaskDescriptor`] is the resolved, immutable form of one configured
//! role. The [`TaskRegistry`] owns the descriptors of a workflow in
//! declaration order; that order is used for every deterministic tie-break
//! (level ordering, trace ordering).

use crate::config::{AgentConfig, WorkflowConfig};
use crate::error::{Result, WorkflowError};
use crate::prompt::{PromptRenderer, default_template};
use agent_core::{ResultShape, TaskRequest};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tracing::{debug, info};

static ROLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[a-z][a-z0-9_]*$").unwrap()
});

/// One configured role, resolved at workflow construction
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDescriptor {
    /// Unique role name
    pub role: String,
    /// Whether the workflow's success depends on this role
    pub required: bool,
    /// Declared dependencies, deduplicated, in declaration order
    pub dependencies: Vec<String>,
    /// MiniJinja template the prompt is rendered from
    pub prompt_template: String,
    /// Schema the output must conform to
    pub result_shape: ResultShape,
    /// Tools the agent may call
    pub tools: Vec<String>,
    /// Model override
    pub model: Option<String>,
    /// Role instructions
    pub instructions: String,
    /// Placeholder text for a missing result
    pub fallback: Option<String>,
}

impl TaskDescriptor {
    /// Build the provider request for an already rendered prompt
    pub fn request(&self, prompt: String) -> TaskRequest {
        TaskRequest {
            role: self.role.clone(),
            prompt,
            tools: self.tools.clone(),
            result_shape: self.result_shape,
            model: self.model.clone(),
            instructions: (!self.instructions.is_empty()).then(|| self.instructions.clone()),
        }
    }

    fn from_config(config: &AgentConfig, known_roles: &HashSet<&str>) -> Self {
        let mut seen = HashSet::new();
        let dependencies: Vec<String> = config
            .dependencies
            .iter()
            .filter(|dep| seen.insert(dep.as_str()))
            .cloned()
            .collect();

        let prompt_template = match &config.prompt {
            Some(template) => template.clone(),
            None => {
                let resolvable: Vec<String> = dependencies
                    .iter()
                    .filter(|dep| known_roles.contains(dep.as_str()))
                    .cloned()
                    .collect();
                default_template(&config.instructions, &resolvable)
            }
        };

        Self {
            role: config.role.clone(),
            required: config.required,
            dependencies,
            prompt_template,
            result_shape: config.result_shape,
            tools: config.tools.clone(),
            model: config.model.clone(),
            instructions: config.instructions.clone(),
            fallback: config.fallback.clone(),
        }
    }
}

/// Immutable set of task descriptors for one workflow
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    descriptors: Vec<TaskDescriptor>,
    index: HashMap<String, usize>,
}

impl TaskRegistry {
    /// Build the registry from a workflow configuration
    ///
    /// Disabled roles are left out. Duplicate or malformed role names,
    /// disabled required roles, and templates that do not compile are
    /// configuration errors.
    pub fn from_config(config: &WorkflowConfig) -> Result<Self> {
        if config.agents.is_empty() {
            return Err(WorkflowError::Configuration(
                "workflow declares no agents".to_string(),
            ));
        }

        let mut all_roles = HashSet::new();
        for agent in &config.agents {
            if !ROLE_PATTERN.is_match(&agent.role) {
                return Err(WorkflowError::Configuration(format!(
                    "role '{}' must match {}",
                    agent.role,
                    ROLE_PATTERN.as_str()
                )));
            }
            if !all_roles.insert(agent.role.as_str()) {
                return Err(WorkflowError::Configuration(format!(
                    "duplicate role '{}'",
                    agent.role
                )));
            }
            if !agent.enabled && agent.required {
                return Err(WorkflowError::Configuration(format!(
                    "required role '{}' is disabled",
                    agent.role
                )));
            }
        }

        let enabled_roles: HashSet<&str> = config
            .agents
            .iter()
            .filter(|a| a.enabled)
            .map(|a| a.role.as_str())
            .collect();

        let renderer = PromptRenderer::new();
        let mut descriptors = Vec::with_capacity(enabled_roles.len());

        for agent in &config.agents {
            if !agent.enabled {
                info!("Role '{}' is disabled and will not be created", agent.role);
                continue;
            }

            let descriptor = TaskDescriptor::from_config(agent, &enabled_roles);
            renderer
                .validate(&descriptor.prompt_template)
                .map_err(|e| {
                    WorkflowError::Configuration(format!(
                        "prompt template for '{}' does not compile: {e}",
                        agent.role
                    ))
                })?;

            debug!(
                "Registered role '{}' (required: {}, shape: {})",
                descriptor.role,
                descriptor.required,
                descriptor.result_shape.schema_name()
            );
            descriptors.push(descriptor);
        }

        Ok(Self::from_descriptors(descriptors))
    }

    fn from_descriptors(descriptors: Vec<TaskDescriptor>) -> Self {
        let index = descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| (d.role.clone(), i))
            .collect();
        Self { descriptors, index }
    }

    /// Look up a descriptor by role
    pub fn get(&self, role: &str) -> Option<&TaskDescriptor> {
        self.index.get(role).map(|&i| &self.descriptors[i])
    }

    /// Declaration position of a role
    pub fn position(&self, role: &str) -> Option<usize> {
        self.index.get(role).copied()
    }

    /// Check if a role is registered
    pub fn contains(&self, role: &str) -> bool {
        self.index.contains_key(role)
    }

    /// Descriptors in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &TaskDescriptor> {
        self.descriptors.iter()
    }

    /// Role names in declaration order
    pub fn roles(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.role.as_str()).collect()
    }

    /// Get the number of registered roles
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workflow(agents: Vec<AgentConfig>) -> WorkflowConfig {
        WorkflowConfig::new(agents)
    }

    #[test]
    fn test_declaration_order_preserved() {
        let registry = TaskRegistry::from_config(&workflow(vec![
            AgentConfig::new("market_analysis"),
            AgentConfig::new("risk_assessment").depends_on(["market_analysis"]),
            AgentConfig::new("synthesis").depends_on(["market_analysis", "risk_assessment"]),
        ]))
        .unwrap();

        assert_eq!(
            registry.roles(),
            vec!["market_analysis", "risk_assessment", "synthesis"]
        );
        assert_eq!(registry.position("synthesis"), Some(2));
    }

    #[test]
    fn test_duplicate_role_rejected() {
        let err = TaskRegistry::from_config(&workflow(vec![
            AgentConfig::new("a"),
            AgentConfig::new("a"),
        ]))
        .unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: duplicate role 'a'");
    }

    #[test]
    fn test_invalid_role_rejected() {
        let result = TaskRegistry::from_config(&workflow(vec![AgentConfig::new("Market Analysis")]));
        assert!(matches!(result, Err(WorkflowError::Configuration(_))));
    }

    #[test]
    fn test_empty_workflow_rejected() {
        assert!(TaskRegistry::from_config(&workflow(Vec::new())).is_err());
    }

    #[test]
    fn test_disabled_roles() {
        let mut news = AgentConfig::new("news").optional();
        news.enabled = false;

        let registry = TaskRegistry::from_config(&workflow(vec![
            AgentConfig::new("a"),
            news,
            AgentConfig::new("b").depends_on(["a", "news"]),
        ]))
        .unwrap();

        assert_eq!(registry.roles(), vec!["a", "b"]);
        // Declared dependencies are kept; the graph builder drops the dangling one
        assert_eq!(registry.get("b").unwrap().dependencies, vec!["a", "news"]);
        assert!(!registry.get("b").unwrap().prompt_template.contains("news"));

        let mut required = AgentConfig::new("news");
        required.enabled = false;
        assert!(TaskRegistry::from_config(&workflow(vec![AgentConfig::new("a"), required])).is_err());
    }

    #[test]
    fn test_bad_template_rejected() {
        let result = TaskRegistry::from_config(&workflow(vec![
            AgentConfig::new("a").prompt("{% for x in %}"),
        ]));
        assert!(matches!(result, Err(WorkflowError::Configuration(_))));
    }

    #[test]
    fn test_duplicate_dependencies_collapsed() {
        let registry = TaskRegistry::from_config(&workflow(vec![
            AgentConfig::new("a"),
            AgentConfig::new("b").depends_on(["a", "a"]),
        ]))
        .unwrap();
        assert_eq!(registry.get("b").unwrap().dependencies, vec!["a"]);
    }

    #[test]
    fn test_request_from_descriptor() {
        let registry = TaskRegistry::from_config(&workflow(vec![
            AgentConfig::new("market_analysis")
                .tools(["stock_quote"])
                .result_shape(ResultShape::MarketAnalysis)
                .instructions("Be concise."),
        ]))
        .unwrap();

        let request = registry.get("market_analysis").unwrap().request("prompt".to_string());
        assert_eq!(request.role, "market_analysis");
        assert_eq!(request.tools, vec!["stock_quote"]);
        assert_eq!(request.result_shape, ResultShape::MarketAnalysis);
        assert_eq!(request.instructions.as_deref(), Some("Be concise."));
    }
}
