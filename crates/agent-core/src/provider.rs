//! Agent provider seam
//!
//! An agent provider runs one role's prompt against an LLM-backed agent with
//! a bounded set of tools and returns the agent's output. The workflow engine
//! only depends on this trait; concrete providers live outside this workspace.

use crate::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured schema a task's output is expected to conform to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultShape {
    /// Market analysis findings (trend, key metrics, sentiment)
    MarketAnalysis,
    /// Risk assessment findings (risk level, factors)
    RiskAssessment,
    /// Final synthesized investment report
    InvestmentAnalysis,
    /// Free-form output
    #[default]
    Untyped,
}

impl ResultShape {
    /// Name of the schema the provider is asked to produce
    pub fn schema_name(&self) -> &'static str {
        match self {
            Self::MarketAnalysis => "MarketAnalysisResult",
            Self::RiskAssessment => "RiskAssessmentResult",
            Self::InvestmentAnalysis => "InvestmentAnalysis",
            Self::Untyped => "Untyped",
        }
    }

    /// Whether the provider is expected to return structured JSON
    pub fn is_structured(&self) -> bool {
        !matches!(self, Self::Untyped)
    }
}

/// Everything a provider needs to run one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Role being executed (e.g., "market_analysis")
    pub role: String,
    /// Fully rendered prompt
    pub prompt: String,
    /// Names of the tools the agent may call
    pub tools: Vec<String>,
    /// Schema the output must conform to
    pub result_shape: ResultShape,
    /// Model override for this role
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Role instructions, usable as a system prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Output of a successful task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TaskOutput {
    /// Native structured result
    Structured(Value),
    /// Plain text result
    Text(String),
}

impl TaskOutput {
    /// Value written into the execution context for downstream tasks
    pub fn to_context_value(&self) -> Value {
        match self {
            Self::Structured(value) => value.clone(),
            Self::Text(text) => Value::String(text.clone()),
        }
    }

    /// Flat text rendering of the output
    pub fn to_text(&self) -> String {
        match self {
            Self::Structured(value) => value.to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

/// Trait for agent providers
///
/// Implementations wrap a specific LLM backend and agent framework. A provider
/// is expected to honor its own call timeout and surface it as
/// [`ProviderError::Timeout`]; the workflow engine never cancels a task.
#[async_trait]
pub trait AgentProvider: Send + Sync {
    /// Run a single task and return its typed result
    async fn run_task(&self, request: TaskRequest) -> Result<TaskOutput, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_shape_parsing() {
        let shape: ResultShape = serde_json::from_value(json!("risk_assessment")).unwrap();
        assert_eq!(shape, ResultShape::RiskAssessment);
        assert_eq!(shape.schema_name(), "RiskAssessmentResult");
        assert!(!ResultShape::default().is_structured());
    }

    #[test]
    fn test_context_value() {
        let structured = TaskOutput::Structured(json!({ "risk_level": "high" }));
        assert_eq!(
            structured.to_context_value(),
            json!({ "risk_level": "high" })
        );

        let text = TaskOutput::Text("bullish".to_string());
        assert_eq!(text.to_context_value(), json!("bullish"));
        assert_eq!(text.to_text(), "bullish");
    }
}
