//! Run-scoped execution context
//!
//! The `ExecutionContext` is the key-value store that carries the query, the
//! detected ticker, and every upstream task result into the prompts of later
//! tasks. One context is created per workflow run and is never shared between
//! runs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Well-known context keys seeded at the start of every run
pub mod keys {
    /// The user's natural-language query
    pub const QUERY: &str = "query";
    /// Stock ticker the run is about (e.g., "AAPL")
    pub const TICKER: &str = "ticker";
    /// Name of the workflow being executed
    pub const WORKFLOW_TYPE: &str = "workflow_type";
}

/// Shared key-value store for a single workflow run
///
/// Task results are stored under their role name, in their native structured
/// form when the task produced JSON and as a JSON string otherwise.
///
/// # Example
///
/// ```
/// use agent_core::ExecutionContext;
///
/// let ctx = ExecutionContext::seeded("Should I buy AAPL?", "AAPL", "investment_analysis");
///
/// assert_eq!(ctx.query(), Some("Should I buy AAPL?"));
/// assert_eq!(ctx.ticker(), Some("AAPL"));
/// assert_eq!(ctx.workflow_type(), Some("investment_analysis"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    data: BTreeMap<String, Value>,
}

impl ExecutionContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context seeded with the query, ticker, and workflow type
    pub fn seeded(
        query: impl Into<String>,
        ticker: impl Into<String>,
        workflow_type: impl Into<String>,
    ) -> Self {
        let mut ctx = Self::new();
        ctx.insert(keys::QUERY, Value::String(query.into()));
        ctx.insert(keys::TICKER, Value::String(ticker.into()));
        ctx.insert(keys::WORKFLOW_TYPE, Value::String(workflow_type.into()));
        ctx
    }

    /// Get the query
    pub fn query(&self) -> Option<&str> {
        self.get(keys::QUERY).and_then(Value::as_str)
    }

    /// Get the ticker
    pub fn ticker(&self) -> Option<&str> {
        self.get(keys::TICKER).and_then(Value::as_str)
    }

    /// Get the workflow type
    pub fn workflow_type(&self) -> Option<&str> {
        self.get(keys::WORKFLOW_TYPE).and_then(Value::as_str)
    }

    /// Insert a value into the context, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a value from the context
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Insert a typed value into the context
    ///
    /// Serializes the value to JSON before storing.
    pub fn insert_typed<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> crate::Result<()> {
        let json_value = serde_json::to_value(value).map_err(|e| {
            crate::Error::Serialization(format!("Failed to serialize context value: {e}"))
        })?;
        self.data.insert(key.into(), json_value);
        Ok(())
    }

    /// Get a typed value from the context
    ///
    /// Deserializes the JSON value into the specified type.
    pub fn get_typed<T: for<'de> Deserialize<'de>>(&self, key: &str) -> crate::Result<Option<T>> {
        match self.data.get(key) {
            None => Ok(None),
            Some(value) => {
                let typed = serde_json::from_value(value.clone()).map_err(|e| {
                    crate::Error::Serialization(format!(
                        "Failed to deserialize context value '{key}': {e}"
                    ))
                })?;
                Ok(Some(typed))
            }
        }
    }

    /// Check if a key exists in the context
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Iterate over all keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Get the number of entries in the context
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the context is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The whole context as a JSON object, used as template variables
    pub fn to_template_value(&self) -> Value {
        let map: Map<String, Value> = self
            .data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Value::Object(map)
    }
}
