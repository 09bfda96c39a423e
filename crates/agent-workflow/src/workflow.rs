//! Workflow definition and execution
//!
//! A [`Workflow`] is built once per configured workflow. It owns its task
//! registry, dependency graph and level plan; every run gets a fresh
//! execution context and fresh execution records.

use crate::config::WorkflowConfig;
use crate::descriptor::{TaskDescriptor, TaskRegistry};
use crate::engine::{ExecutionEngine, RunOptions, RunReport};
use crate::error::Result;
use crate::graph::{DependencyGraph, Edge};
use crate::prompt::PromptRenderer;
use crate::scheduler::{LevelPlan, compute_levels};
use agent_core::{AgentProvider, ExecutionContext};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A configured, ready-to-run workflow
///
/// # Example
///
/// ```no_run
/// use agent_workflow::{AgentConfig, RunOptions, Workflow, WorkflowConfig};
/// use agent_core::AgentProvider;
/// use std::sync::Arc;
///
/// # async fn example(provider: Arc<dyn AgentProvider>) -> agent_workflow::Result<()> {
/// let config = WorkflowConfig::new(vec![
///     AgentConfig::new("market_analysis"),
///     AgentConfig::new("synthesis").depends_on(["market_analysis"]),
/// ]);
/// let workflow = Workflow::from_config("investment_analysis", &config)?;
///
/// let report = workflow
///     .run_query(provider, "Should I buy AAPL?", "AAPL", RunOptions::default())
///     .await;
/// println!("success: {}", report.is_success());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Workflow {
    name: String,
    synthesis_role: String,
    timeout: Option<Duration>,
    registry: TaskRegistry,
    graph: DependencyGraph,
    plan: LevelPlan,
    renderer: Arc<PromptRenderer>,
    warnings: Vec<String>,
}

impl Workflow {
    /// Build a workflow from its configuration
    ///
    /// Fails on configuration errors; dangling dependencies, cycles, and a
    /// missing synthesis role only produce warnings.
    pub fn from_config(name: impl Into<String>, config: &WorkflowConfig) -> Result<Self> {
        let name = name.into();
        let registry = TaskRegistry::from_config(config)?;
        let graph = DependencyGraph::build(&registry);
        let plan = compute_levels(&graph);

        let mut warnings = graph.warnings().to_vec();
        if plan.has_cycle() {
            warnings.push(format!(
                "Dependency cycle among {:?}; running them one per level",
                plan.cyclic_roles
            ));
        }
        if !registry.contains(&config.synthesis_role) {
            let message = format!(
                "Synthesis role '{}' is not configured; reports will be degraded",
                config.synthesis_role
            );
            warn!("{}", message);
            warnings.push(message);
        }

        info!(
            "Workflow '{}' ready: {} roles in {} levels",
            name,
            registry.len(),
            plan.levels.len()
        );

        Ok(Self {
            name,
            synthesis_role: config.synthesis_role.clone(),
            timeout: config.timeout(),
            registry,
            graph,
            plan,
            renderer: Arc::new(PromptRenderer::new()),
            warnings,
        })
    }

    /// Workflow name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Role whose output is the final report
    pub fn synthesis_role(&self) -> &str {
        &self.synthesis_role
    }

    /// Configured time budget
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Task registry
    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Look up a role's descriptor
    pub fn descriptor(&self, role: &str) -> Option<&TaskDescriptor> {
        self.registry.get(role)
    }

    /// Dependency graph
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Execution levels
    pub fn levels(&self) -> &[Vec<String>] {
        &self.plan.levels
    }

    /// Dependency edges
    pub fn edges(&self) -> Vec<Edge> {
        self.graph.edges()
    }

    /// Non-fatal configuration problems found at construction
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Run the workflow with a caller-seeded context
    ///
    /// When `options` carries no timeout the configured one applies.
    pub async fn run(
        &self,
        provider: Arc<dyn AgentProvider>,
        context: ExecutionContext,
        mut options: RunOptions,
    ) -> RunReport {
        if options.timeout.is_none() {
            options.timeout = self.timeout;
        }
        let engine = ExecutionEngine::new(&self.registry, &self.graph, Arc::clone(&self.renderer));
        engine.run(&self.plan.levels, provider, context, options).await
    }

    /// Run the workflow for a query about a ticker
    pub async fn run_query(
        &self,
        provider: Arc<dyn AgentProvider>,
        query: &str,
        ticker: &str,
        options: RunOptions,
    ) -> RunReport {
        let context = ExecutionContext::seeded(query, ticker, self.name.as_str());
        self.run(provider, context, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AgentConfig, WorkflowCatalog};
    use crate::execution::TaskStatus;
    use agent_core::{ProviderError, TaskOutput, TaskRequest};
    use async_trait::async_trait;

    struct RoleEcho;

    #[async_trait]
    impl AgentProvider for RoleEcho {
        async fn run_task(&self, request: TaskRequest) -> std::result::Result<TaskOutput, ProviderError> {
            Ok(TaskOutput::Text(request.prompt))
        }
    }

    const YAML: &str = r"
workflows:
  investment_analysis:
    timeout_secs: 60
    agents:
      - role: market_analysis
        instructions: Analyze {{ ticker }}.
      - role: risk_assessment
        dependencies: [market_analysis, sentiment]
      - role: synthesis
        dependencies: [market_analysis, risk_assessment]
";

    #[test]
    fn test_from_catalog() {
        let catalog = WorkflowCatalog::from_yaml_str(YAML).unwrap();
        let config = catalog.get_workflow_config("investment_analysis").unwrap();
        let workflow = Workflow::from_config("investment_analysis", config).unwrap();

        assert_eq!(
            workflow.levels(),
            [
                vec!["market_analysis".to_string()],
                vec!["risk_assessment".to_string()],
                vec!["synthesis".to_string()],
            ]
        );
        assert_eq!(workflow.timeout(), Some(Duration::from_secs(60)));
        assert_eq!(workflow.warnings().len(), 1);
        assert!(workflow.warnings()[0].contains("'sentiment'"));
        assert_eq!(workflow.edges().len(), 3);
    }

    #[test]
    fn test_missing_synthesis_role_warns() {
        let config = WorkflowConfig::new(vec![AgentConfig::new("a")]);
        let workflow = Workflow::from_config("w", &config).unwrap();
        assert!(workflow.warnings()[0].contains("Synthesis role 'synthesis'"));
    }

    #[tokio::test]
    async fn test_run_query_seeds_context() {
        let catalog = WorkflowCatalog::from_yaml_str(YAML).unwrap();
        let config = catalog.get_workflow_config("investment_analysis").unwrap();
        let workflow = Workflow::from_config("investment_analysis", config).unwrap();

        let report = workflow
            .run_query(Arc::new(RoleEcho), "Is NVDA overvalued?", "NVDA", RunOptions::default())
            .await;

        assert!(report.is_success());
        assert_eq!(report.status("synthesis"), Some(TaskStatus::Completed));
        assert_eq!(report.context.workflow_type(), Some("investment_analysis"));

        let market = report.context.get("market_analysis").unwrap().as_str().unwrap();
        assert!(market.starts_with("Analyze NVDA."));
        assert!(market.contains("Query: Is NVDA overvalued?"));

        // Two runs never share state
        let again = workflow
            .run_query(Arc::new(RoleEcho), "Is AMD overvalued?", "AMD", RunOptions::default())
            .await;
        assert_eq!(again.context.ticker(), Some("AMD"));
        assert_eq!(report.context.ticker(), Some("NVDA"));
    }
}
