//! Stock investment analysis on top of agent-workflow
//!
//! This crate wires the generic dependency-graph workflow engine to the
//! investment analysis domain:
//!
//! - Ticker detection from natural-language queries
//! - Typed result schemas (`MarketAnalysisResult`, `RiskAssessmentResult`,
//!   `InvestmentAnalysis`)
//! - Result aggregation with a degraded fallback when the synthesis step
//!   does not complete
//! - `InvestmentAnalysisService`, the entry point for outer layers
//!
//! # Example
//!
//! ```rust,ignore
//! use agent_core::ProviderRegistry;
//! use agent_stock::{InvestmentAnalysisService, StockConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> agent_stock::Result<()> {
//!     let providers = ProviderRegistry::new().with_provider("anthropic", Arc::new(my_provider));
//!     let service =
//!         InvestmentAnalysisService::with_default_workflows(providers, StockConfig::default())?;
//!
//!     let outcome = service.execute("Should I buy AAPL?", "anthropic", None).await?;
//!     println!("{}", outcome.result.format_report());
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
pub mod schemas;
pub mod service;
pub mod ticker;

// Re-export main types for convenience
pub use aggregator::ResultAggregator;
pub use config::{DEFAULT_WORKFLOW, StockConfig, StockConfigBuilder};
pub use error::{Result, StockError};
pub use schemas::{InvestmentAnalysis, MarketAnalysisResult, RiskAssessmentResult};
pub use service::{
    AnalysisOutcome, InvestmentAnalysisService, RunPhase, StatusSnapshot, default_catalog,
};
pub use ticker::{TickerDetector, normalize_ticker};
