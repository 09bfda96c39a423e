//! Command-line interface for agent-rs

use agent_core::{AgentProvider, ProviderError, ProviderRegistry, TaskOutput, TaskRequest};
use agent_stock::{InvestmentAnalysisService, StockConfig, TickerDetector, default_catalog};
use agent_workflow::{Workflow, WorkflowCatalog};
use anyhow::Context as _;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "agent-cli")]
#[command(about = "Inspect and dry-run agent-rs investment workflows", long_about = None)]
struct Cli {
    /// Workflow YAML file (defaults to $AGENT_WORKFLOWS_PATH, then the built-in workflows)
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the execution levels and dependency edges of a workflow
    Plan {
        /// Workflow name
        #[arg(default_value = agent_stock::DEFAULT_WORKFLOW)]
        workflow: String,
    },

    /// Detect the ticker in a query
    Ticker {
        /// Natural-language query
        query: String,
    },

    /// Build every workflow and report configuration warnings
    Validate,

    /// Run a workflow with an offline provider that echoes each rendered prompt
    DryRun {
        /// Natural-language query
        query: String,

        /// Workflow name
        #[arg(short, long, default_value = agent_stock::DEFAULT_WORKFLOW)]
        workflow: String,

        /// Ticker override
        #[arg(short, long)]
        ticker: Option<String>,
    },
}

/// Provider that answers every task with its own prompt
struct EchoProvider;

#[async_trait]
impl AgentProvider for EchoProvider {
    async fn run_task(&self, request: TaskRequest) -> Result<TaskOutput, ProviderError> {
        Ok(TaskOutput::Text(request.prompt))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = agent_utils::Config::from_env().context("invalid environment configuration")?;
    agent_utils::init_tracing_with(&config);

    let cli = Cli::parse();
    info!("Starting {} ({})", config.app_name, config.environment);

    let catalog = load_catalog(cli.file.as_ref().or(config.workflows_path.as_ref()))?;

    match cli.command {
        Commands::Plan { workflow } => plan(&catalog, &workflow),
        Commands::Ticker { query } => {
            ticker(&query);
            Ok(())
        }
        Commands::Validate => validate(&catalog),
        Commands::DryRun {
            query,
            workflow,
            ticker,
        } => dry_run(&catalog, &query, workflow, ticker.as_deref()).await,
    }
}

fn load_catalog(path: Option<&PathBuf>) -> anyhow::Result<WorkflowCatalog> {
    match path {
        Some(path) => {
            info!("Loading workflows from {}", path.display());
            WorkflowCatalog::from_file(path)
                .with_context(|| format!("failed to load workflows from {}", path.display()))
        }
        None => default_catalog().context("built-in workflows are invalid"),
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn plan(catalog: &WorkflowCatalog, name: &str) -> anyhow::Result<()> {
    let workflow = Workflow::from_config(name, catalog.get_workflow_config(name)?)?;

    let mut levels = new_table(vec!["Level", "Roles"]);
    for (index, level) in workflow.levels().iter().enumerate() {
        levels.add_row(vec![(index + 1).to_string(), level.join(", ")]);
    }

    let mut roles = new_table(vec!["Role", "Required", "Result shape", "Depends on", "Tools"]);
    for descriptor in workflow.registry().iter() {
        roles.add_row(vec![
            descriptor.role.clone(),
            descriptor.required.to_string(),
            descriptor.result_shape.schema_name().to_string(),
            workflow.graph().dependencies_of(&descriptor.role).join(", "),
            descriptor.tools.join(", "),
        ]);
    }

    println!("Workflow: {}", workflow.name());
    if workflow.graph().is_linear_fallback() {
        println!("No dependencies declared: roles run one after another in declaration order.");
    }
    println!("{levels}");
    println!("{roles}");
    print_warnings(&workflow);
    Ok(())
}

fn ticker(query: &str) {
    match TickerDetector::new().detect(query) {
        Some(ticker) => println!("{ticker}"),
        None => println!("No ticker detected"),
    }
}

fn validate(catalog: &WorkflowCatalog) -> anyhow::Result<()> {
    let mut table = new_table(vec!["Workflow", "Roles", "Levels", "Status"]);
    let mut failures = 0;

    for name in catalog.names() {
        let row = match catalog
            .get_workflow_config(name)
            .and_then(|config| Workflow::from_config(name, config))
        {
            Ok(workflow) => {
                let status = if workflow.warnings().is_empty() {
                    "ok".to_string()
                } else {
                    workflow.warnings().join("\n")
                };
                vec![
                    name.to_string(),
                    workflow.registry().len().to_string(),
                    workflow.levels().len().to_string(),
                    status,
                ]
            }
            Err(e) => {
                failures += 1;
                vec![name.to_string(), "-".to_string(), "-".to_string(), e.to_string()]
            }
        };
        table.add_row(row);
    }

    println!("{table}");
    anyhow::ensure!(failures == 0, "{failures} workflow(s) failed to build");
    Ok(())
}

async fn dry_run(
    catalog: &WorkflowCatalog,
    query: &str,
    workflow: String,
    ticker: Option<&str>,
) -> anyhow::Result<()> {
    let providers = ProviderRegistry::new().with_provider("echo", Arc::new(EchoProvider));
    let config = StockConfig::builder().workflow_name(workflow).build()?;
    let service = InvestmentAnalysisService::new(catalog, providers, config)?;

    let outcome = service.execute(query, "echo", ticker).await?;

    let mut table = new_table(vec!["Role", "Status", "Duration (ms)", "Preview"]);
    for node in &outcome.trace.nodes {
        table.add_row(vec![
            node.label.clone(),
            node.status_label.clone(),
            node.duration_ms.map_or_else(|| "-".to_string(), |ms| ms.to_string()),
            node.preview.clone().unwrap_or_default(),
        ]);
    }

    println!("Run {} for {}", outcome.run_id, outcome.ticker);
    println!("{table}");
    println!("{}", outcome.result.format_report());
    println!(
        "success: {}, agent invocations: {}, time: {:.3}s",
        outcome.success, outcome.agent_invocations, outcome.execution_time_secs
    );
    if let Some(error) = &outcome.error {
        println!("error: {error}");
    }
    Ok(())
}

fn print_warnings(workflow: &Workflow) {
    for warning in workflow.warnings() {
        println!("warning: {warning}");
    }
}
