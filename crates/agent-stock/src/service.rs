//! Investment analysis service
//!
//! Entry point used by outer layers (HTTP, CLI, bots): detects the ticker,
//! runs the configured workflow with the selected provider, aggregates the
//! final report, and exposes a live status snapshot for progress polling.

use crate::aggregator::ResultAggregator;
use crate::config::StockConfig;
use crate::error::{Result, StockError};
use crate::schemas::InvestmentAnalysis;
use crate::ticker::TickerDetector;
use agent_core::ProviderRegistry;
use agent_workflow::{
    Edge, ExecutionMap, RunOptions, TraceNode, TraceRecord, Workflow, WorkflowCatalog,
    WorkflowError, build_trace,
};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

/// Built-in workflow definitions
const DEFAULT_WORKFLOWS: &str = include_str!("../config/workflows.yaml");

/// Parse the built-in workflow catalog
pub fn default_catalog() -> Result<WorkflowCatalog> {
    Ok(WorkflowCatalog::from_yaml_str(DEFAULT_WORKFLOWS)?)
}

/// Result of one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    /// Finished in time and every required role completed
    pub success: bool,
    /// Final report, degraded when the synthesis did not complete
    pub result: InvestmentAnalysis,
    /// Per-role trace
    pub trace: TraceRecord,
    /// Number of provider calls made
    pub agent_invocations: usize,
    pub execution_time_secs: f64,
    /// Why the run was not successful
    pub error: Option<String>,
    pub ticker: String,
    pub run_id: String,
}

/// Lifecycle of the most recent run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// Live view of the most recent run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: RunPhase,
    pub nodes: Vec<TraceNode>,
    pub edges: Vec<Edge>,
    /// Final report once the run is over
    pub result: Option<InvestmentAnalysis>,
}

#[derive(Debug, Default)]
struct RunState {
    phase: RunPhase,
    progress: Option<watch::Receiver<ExecutionMap>>,
    result: Option<InvestmentAnalysis>,
}

/// Runs investment analyses over a configured workflow
pub struct InvestmentAnalysisService {
    config: StockConfig,
    workflow: Workflow,
    aggregator: ResultAggregator,
    providers: ProviderRegistry,
    detector: TickerDetector,
    state: RwLock<RunState>,
}

impl InvestmentAnalysisService {
    /// Create a service for the workflow named in `config`
    pub fn new(
        catalog: &WorkflowCatalog,
        providers: ProviderRegistry,
        config: StockConfig,
    ) -> Result<Self> {
        config.validate()?;

        if providers.is_empty() {
            return Err(StockError::Config(
                "no agent providers are registered".to_string(),
            ));
        }

        let workflow_config = catalog.get_workflow_config(&config.workflow_name)?;
        let workflow = Workflow::from_config(&config.workflow_name, workflow_config)?;
        for warning in workflow.warnings() {
            warn!("Workflow '{}': {}", workflow.name(), warning);
        }

        info!(
            "Investment analysis service ready (workflow: {}, providers: {:?})",
            workflow.name(),
            providers.names()
        );

        Ok(Self {
            aggregator: ResultAggregator::for_workflow(&workflow),
            config,
            workflow,
            providers,
            detector: TickerDetector::new(),
            state: RwLock::new(RunState::default()),
        })
    }

    /// Create a service over the built-in workflows
    pub fn with_default_workflows(providers: ProviderRegistry, config: StockConfig) -> Result<Self> {
        Self::new(&default_catalog()?, providers, config)
    }

    /// The workflow this service runs
    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    /// Run an analysis
    ///
    /// Only ticker detection and provider lookup fail with an error; task
    /// failures and timeouts are reported through the outcome.
    pub async fn execute(
        &self,
        query: &str,
        provider: &str,
        ticker_override: Option<&str>,
    ) -> Result<AnalysisOutcome> {
        let ticker = self.detector.resolve(query, ticker_override)?;
        let provider = self
            .providers
            .resolve(provider)
            .map_err(|e| WorkflowError::Configuration(e.to_string()))?;

        let run_id = Uuid::new_v4().to_string();
        info!(
            "Starting run {} for {} with workflow '{}'",
            run_id,
            ticker,
            self.workflow.name()
        );

        let (tx, rx) = watch::channel(ExecutionMap::pending(self.workflow.registry().roles()));
        self.set_state(RunState {
            phase: RunPhase::Running,
            progress: Some(rx),
            result: None,
        });

        let options = RunOptions::default()
            .with_timeout(self.config.timeout)
            .with_progress(tx);
        let report = self.workflow.run_query(provider, query, &ticker, options).await;

        let result = self.aggregator.aggregate(&report.executions, &report.context);
        let trace = build_trace(&report.executions, &report.edges, self.config.preview_len);
        let success = report.is_success();

        let error = report.error.clone().or_else(|| {
            let missing = report.incomplete_required();
            (!missing.is_empty())
                .then(|| format!("Required roles did not complete: {}", missing.join(", ")))
        });

        if let Some(error) = &error {
            warn!("Run {} finished without success: {}", run_id, error);
        } else {
            info!(
                "Run {} completed in {:.2}s",
                run_id,
                report.elapsed.as_secs_f64()
            );
        }

        self.update_state(|state| {
            state.phase = if success {
                RunPhase::Completed
            } else {
                RunPhase::Failed
            };
            state.result = Some(result.clone());
        });

        Ok(AnalysisOutcome {
            success,
            result,
            trace,
            agent_invocations: report.agent_invocations,
            execution_time_secs: report.elapsed.as_secs_f64(),
            error,
            ticker,
            run_id,
        })
    }

    /// Snapshot of the most recent run for progress polling
    pub fn get_status_snapshot(&self) -> StatusSnapshot {
        let (phase, executions, result) = match self.state.read() {
            Ok(state) => (
                state.phase,
                state.progress.as_ref().map(|rx| rx.borrow().clone()),
                state.result.clone(),
            ),
            Err(_) => (RunPhase::Idle, None, None),
        };

        let executions = executions
            .unwrap_or_else(|| ExecutionMap::pending(self.workflow.registry().roles()));
        let trace = build_trace(&executions, &self.workflow.edges(), self.config.preview_len);

        StatusSnapshot {
            status: phase,
            nodes: trace.nodes,
            edges: trace.edges,
            result,
        }
    }

    fn set_state(&self, state: RunState) {
        if let Ok(mut current) = self.state.write() {
            *current = state;
        }
    }

    fn update_state<F: FnOnce(&mut RunState)>(&self, apply: F) {
        if let Ok(mut current) = self.state.write() {
            apply(&mut current);
        }
    }
}

impl std::fmt::Debug for InvestmentAnalysisService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvestmentAnalysisService")
            .field("workflow", &self.workflow.name())
            .field("providers", &self.providers.names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::NO_RECOMMENDATION;
    use agent_core::{AgentProvider, ProviderError, TaskOutput, TaskRequest};
    use agent_workflow::TaskStatus;
    use async_trait::async_trait;
    use mockall::mock;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Arc;

    mock! {
        pub Provider {}

        #[async_trait]
        impl AgentProvider for Provider {
            async fn run_task(&self, request: TaskRequest) -> std::result::Result<TaskOutput, ProviderError>;
        }
    }

    /// Answers every role with a canned result, failing the listed roles
    struct CannedProvider {
        failing: HashSet<&'static str>,
    }

    impl CannedProvider {
        fn healthy() -> Self {
            Self {
                failing: HashSet::new(),
            }
        }

        fn failing(roles: &[&'static str]) -> Self {
            Self {
                failing: roles.iter().copied().collect(),
            }
        }
    }

    #[async_trait]
    impl AgentProvider for CannedProvider {
        async fn run_task(&self, request: TaskRequest) -> std::result::Result<TaskOutput, ProviderError> {
            if self.failing.contains(request.role.as_str()) {
                return Err(ProviderError::RateLimited("429 from upstream".to_string()));
            }
            let value = match request.role.as_str() {
                "market_analysis" => json!({ "trend": "bullish", "sentiment": "positive" }),
                "risk_assessment" => json!({ "risk_level": "moderate", "risk_factors": ["valuation"] }),
                "synthesis" => json!({
                    "recommendation": "buy",
                    "sentiment": "bullish",
                    "confidence": 0.75,
                    "summary": "Solid momentum with moderate risk."
                }),
                _ => return Ok(TaskOutput::Text("ok".to_string())),
            };
            Ok(TaskOutput::Structured(value))
        }
    }

    fn service(provider: Arc<dyn AgentProvider>) -> InvestmentAnalysisService {
        let providers = ProviderRegistry::new().with_provider("mock", provider);
        InvestmentAnalysisService::with_default_workflows(providers, StockConfig::default()).unwrap()
    }

    #[test]
    fn test_default_catalog() {
        let catalog = default_catalog().unwrap();
        assert_eq!(
            catalog.names(),
            vec!["comprehensive_analysis", "investment_analysis"]
        );
        for name in catalog.names() {
            let workflow =
                Workflow::from_config(name, catalog.get_workflow_config(name).unwrap()).unwrap();
            assert!(workflow.warnings().is_empty(), "{name}: {:?}", workflow.warnings());
        }
    }

    #[tokio::test]
    async fn test_successful_run() {
        let service = service(Arc::new(CannedProvider::healthy()));
        assert_eq!(service.get_status_snapshot().status, RunPhase::Idle);

        let outcome = service
            .execute("Should I buy Apple stock?", "mock", None)
            .await
            .unwrap();

        assert!(outcome.success);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.ticker, "AAPL");
        assert_eq!(outcome.agent_invocations, 3);
        assert!(!outcome.result.degraded);
        assert_eq!(outcome.result.recommendation, "buy");
        assert_eq!(outcome.result.ticker, "AAPL");
        assert_eq!(outcome.trace.nodes.len(), 3);
        assert!(outcome.trace.nodes.iter().all(|n| n.status_label == "Completed"));

        let snapshot = service.get_status_snapshot();
        assert_eq!(snapshot.status, RunPhase::Completed);
        assert_eq!(snapshot.edges.len(), 3);
        assert_eq!(snapshot.result.unwrap().recommendation, "buy");
    }

    #[tokio::test]
    async fn test_market_failure_degrades() {
        let service = service(Arc::new(CannedProvider::failing(&["market_analysis"])));

        let outcome = service
            .execute("Is $TSLA a buy?", "mock", None)
            .await
            .unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.agent_invocations, 1);
        assert!(outcome.result.degraded);
        assert_eq!(outcome.result.recommendation, NO_RECOMMENDATION);
        assert_eq!(
            outcome.result.risk_assessment.as_deref(),
            Some("Risk assessment unavailable for this run.")
        );

        let statuses: Vec<TaskStatus> = outcome.trace.nodes.iter().map(|n| n.status).collect();
        assert_eq!(
            statuses,
            vec![TaskStatus::Failed, TaskStatus::Skipped, TaskStatus::Skipped]
        );
        assert!(
            outcome
                .error
                .unwrap()
                .contains("market_analysis, risk_assessment, synthesis")
        );
        assert_eq!(service.get_status_snapshot().status, RunPhase::Failed);
    }

    #[tokio::test]
    async fn test_ticker_not_detected_calls_no_agent() {
        let mut mock = MockProvider::new();
        mock.expect_run_task().times(0);
        let service = service(Arc::new(mock));

        let err = service
            .execute("how are markets doing today?", "mock", None)
            .await
            .unwrap_err();

        assert!(matches!(err, StockError::TickerNotDetected));
        assert_eq!(service.get_status_snapshot().status, RunPhase::Idle);
    }

    #[tokio::test]
    async fn test_ticker_override() {
        let mut mock = MockProvider::new();
        mock.expect_run_task()
            .withf(|req| req.prompt.contains("Ticker: MSFT"))
            .times(3)
            .returning(|_| Ok(TaskOutput::Text("fine".to_string())));
        let service = service(Arc::new(mock));

        let outcome = service
            .execute("Should I buy AAPL?", "mock", Some("msft"))
            .await
            .unwrap();

        assert_eq!(outcome.ticker, "MSFT");
        assert!(outcome.success);
        // Text synthesis is not a structured report
        assert!(outcome.result.degraded);
        assert_eq!(outcome.result.summary, "fine");
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let service = service(Arc::new(CannedProvider::healthy()));
        let err = service
            .execute("Should I buy AAPL?", "ollama", None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StockError::Workflow(WorkflowError::Configuration(_))
        ));
        assert!(err.to_string().contains("ollama"));
    }

    #[test]
    fn test_unknown_workflow() {
        let providers =
            ProviderRegistry::new().with_provider("mock", Arc::new(CannedProvider::healthy()));
        let config = StockConfig::builder().workflow_name("day_trading").build().unwrap();
        let err = InvestmentAnalysisService::with_default_workflows(providers, config).unwrap_err();
        assert!(err.to_string().contains("Unknown workflow 'day_trading'"));
    }

    #[test]
    fn test_no_providers() {
        let result = InvestmentAnalysisService::with_default_workflows(
            ProviderRegistry::new(),
            StockConfig::default(),
        );
        assert!(matches!(result, Err(StockError::Config(_))));
    }
}
