//! Typed result schemas
//!
//! Providers are asked to answer in these shapes (see
//! [`agent_core::ResultShape`]). Every field has a default so that partially
//! filled answers still deserialize.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Recommendation used when none could be derived
pub const NO_RECOMMENDATION: &str = "No specific recommendation provided";

/// Sentiment used when none could be derived
pub const NEUTRAL_SENTIMENT: &str = "neutral";

/// Confidence reported for degraded reports
pub const DEGRADED_CONFIDENCE: f64 = 0.5;

/// Findings of the market analysis role
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketAnalysisResult {
    pub ticker: String,
    pub current_price: Option<f64>,
    /// Price trend, e.g. "bullish"
    pub trend: String,
    pub sentiment: String,
    pub key_metrics: BTreeMap<String, Value>,
    pub summary: String,
}

/// Findings of the risk assessment role
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskAssessmentResult {
    /// Overall level, e.g. "low", "moderate", "high"
    pub risk_level: String,
    pub risk_factors: Vec<String>,
    pub volatility: Option<String>,
    pub summary: String,
}

/// Final investment report
///
/// `degraded` is set when the report was assembled from upstream findings
/// because the synthesis role did not produce one. Degraded reports carry
/// placeholder recommendation, sentiment and confidence values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestmentAnalysis {
    pub ticker: String,
    pub recommendation: String,
    pub sentiment: String,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    pub summary: String,
    pub market_analysis: Option<String>,
    pub risk_assessment: Option<String>,
    pub key_points: Vec<String>,
    pub degraded: bool,
}

impl Default for InvestmentAnalysis {
    fn default() -> Self {
        Self {
            ticker: String::new(),
            recommendation: NO_RECOMMENDATION.to_string(),
            sentiment: NEUTRAL_SENTIMENT.to_string(),
            confidence: DEGRADED_CONFIDENCE,
            summary: String::new(),
            market_analysis: None,
            risk_assessment: None,
            key_points: Vec::new(),
            degraded: true,
        }
    }
}

impl InvestmentAnalysis {
    /// Minimal degraded report for a ticker
    pub fn placeholder(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Self::default()
        }
    }

    /// Fill blank fields and clamp the confidence
    pub(crate) fn normalized(mut self) -> Self {
        if self.recommendation.trim().is_empty() {
            self.recommendation = NO_RECOMMENDATION.to_string();
        }
        if self.sentiment.trim().is_empty() {
            self.sentiment = NEUTRAL_SENTIMENT.to_string();
        }
        if !self.confidence.is_finite() {
            self.confidence = DEGRADED_CONFIDENCE;
        }
        self.confidence = self.confidence.clamp(0.0, 1.0);
        self
    }

    /// Render the report as Markdown
    pub fn format_report(&self) -> String {
        let mut out = format!("# Investment Analysis: {}\n\n", self.ticker);

        if self.degraded {
            out.push_str("> Partial report: the synthesis step did not complete.\n\n");
        }

        out.push_str(&format!("**Recommendation:** {}\n", self.recommendation));
        out.push_str(&format!("**Sentiment:** {}\n", self.sentiment));
        out.push_str(&format!("**Confidence:** {:.0}%\n", self.confidence * 100.0));

        if !self.summary.is_empty() {
            out.push_str(&format!("\n{}\n", self.summary));
        }
        if let Some(market) = &self.market_analysis {
            out.push_str(&format!("\n## Market Analysis\n{market}\n"));
        }
        if let Some(risk) = &self.risk_assessment {
            out.push_str(&format!("\n## Risk Assessment\n{risk}\n"));
        }
        if !self.key_points.is_empty() {
            out.push_str("\n## Key Points\n");
            for point in &self.key_points {
                out.push_str(&format!("- {point}\n"));
            }
        }

        out
    }
}
