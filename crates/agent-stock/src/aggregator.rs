//! Result aggregation
//!
//! Turns the execution records and final context of a run into an
//! [`InvestmentAnalysis`]. When the synthesis role produced a structured
//! report it is returned as is; otherwise a degraded report is assembled from
//! whatever upstream findings exist, with placeholder values for the rest.
//! Aggregation never fails.

use crate::schemas::{
    InvestmentAnalysis, MarketAnalysisResult, NO_RECOMMENDATION, RiskAssessmentResult,
};
use agent_core::{ExecutionContext, ResultShape};
use agent_workflow::{ExecutionMap, TaskStatus, Workflow, trace};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Maximum length of an untyped finding copied into the key points
const KEY_POINT_LEN: usize = 200;

#[derive(Debug, Clone)]
struct RoleSlot {
    role: String,
    label: String,
    shape: ResultShape,
    fallback: Option<String>,
}

/// Builds the final report of a run
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    synthesis_role: String,
    slots: Vec<RoleSlot>,
}

impl ResultAggregator {
    /// Create an aggregator for a workflow's roles
    pub fn for_workflow(workflow: &Workflow) -> Self {
        let slots = workflow
            .registry()
            .iter()
            .filter(|d| d.role != workflow.synthesis_role())
            .map(|d| RoleSlot {
                role: d.role.clone(),
                label: trace::title_case(&d.role),
                shape: d.result_shape,
                fallback: d.fallback.clone(),
            })
            .collect();

        Self {
            synthesis_role: workflow.synthesis_role().to_string(),
            slots,
        }
    }

    /// Build the report
    pub fn aggregate(&self, executions: &ExecutionMap, context: &ExecutionContext) -> InvestmentAnalysis {
        let ticker = context.ticker().unwrap_or_default();
        let status = executions.status(&self.synthesis_role);

        let synthesis_output = (status == Some(TaskStatus::Completed))
            .then(|| context.get(&self.synthesis_role))
            .flatten();

        if let Some(report) = synthesis_output
            .and_then(parse::<InvestmentAnalysis>)
            .filter(has_findings)
        {
            debug!("Using synthesis report from '{}'", self.synthesis_role);
            let mut report = report.normalized();
            report.degraded = false;
            if report.ticker.is_empty() {
                report.ticker = ticker.to_string();
            }
            return report;
        }

        let reason = match status {
            Some(TaskStatus::Completed) => "returned no structured report".to_string(),
            Some(status) => status.to_string(),
            None => "has no execution record".to_string(),
        };
        warn!(
            "Synthesis role '{}' {}; building degraded report",
            self.synthesis_role, reason
        );

        let mut report = self.degraded(ticker, context);
        report.summary = match synthesis_output.and_then(Value::as_str) {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => format!(
                "Synthesis {reason}; this report was assembled from the available upstream findings."
            ),
        };
        report
    }

    fn degraded(&self, ticker: &str, context: &ExecutionContext) -> InvestmentAnalysis {
        let mut report = InvestmentAnalysis::placeholder(ticker);

        for slot in &self.slots {
            let value = context.get(&slot.role);

            match slot.shape {
                ResultShape::MarketAnalysis if report.market_analysis.is_none() => {
                    report.market_analysis = match value.and_then(parse::<MarketAnalysisResult>) {
                        Some(market) => {
                            if !market.sentiment.trim().is_empty() {
                                report.sentiment = market.sentiment.clone();
                            }
                            non_empty(describe_market(&market)).or_else(|| value.map(text_of))
                        }
                        None => value.map(text_of).or_else(|| slot.fallback.clone()),
                    };
                }
                ResultShape::RiskAssessment if report.risk_assessment.is_none() => {
                    report.risk_assessment = match value.and_then(parse::<RiskAssessmentResult>) {
                        Some(risk) => {
                            report
                                .key_points
                                .extend(risk.risk_factors.iter().map(|f| format!("Risk: {f}")));
                            non_empty(describe_risk(&risk)).or_else(|| value.map(text_of))
                        }
                        None => value.map(text_of).or_else(|| slot.fallback.clone()),
                    };
                }
                _ => {
                    let finding = value
                        .map(|v| trace::truncate(&text_of(v), KEY_POINT_LEN))
                        .or_else(|| slot.fallback.clone());
                    if let Some(finding) = finding {
                        report.key_points.push(format!("{}: {}", slot.label, finding));
                    }
                }
            }
        }

        report
    }
}

/// Parse a context value as `T`, accepting JSON objects and JSON text
fn parse<T: DeserializeOwned>(value: &Value) -> Option<T> {
    match value {
        Value::Object(_) => serde_json::from_value(value.clone()).ok(),
        Value::String(text) => {
            let text = text.trim();
            text.starts_with('{')
                .then(|| serde_json::from_str(text).ok())
                .flatten()
        }
        _ => None,
    }
}

/// A synthesis counts only if it states a recommendation or a summary;
/// every field defaults, so any JSON object would otherwise parse.
fn has_findings(report: &InvestmentAnalysis) -> bool {
    let recommendation = report.recommendation.trim();
    (!recommendation.is_empty() && recommendation != NO_RECOMMENDATION)
        || !report.summary.trim().is_empty()
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn non_empty(text: String) -> Option<String> {
    (!text.trim().is_empty()).then_some(text)
}

fn describe_market(market: &MarketAnalysisResult) -> String {
    if !market.summary.trim().is_empty() {
        return market.summary.clone();
    }
    let mut parts = Vec::new();
    if !market.trend.is_empty() {
        parts.push(format!("Trend: {}", market.trend));
    }
    if let Some(price) = market.current_price {
        parts.push(format!("Price: {price:.2}"));
    }
    parts.join(", ")
}

fn describe_risk(risk: &RiskAssessmentResult) -> String {
    if !risk.summary.trim().is_empty() {
        return risk.summary.clone();
    }
    if risk.risk_level.is_empty() {
        String::new()
    } else {
        format!("Risk level: {}", risk.risk_level)
    }
}
