//! Execution trace for observability
//!
//! The trace carries one node per role with its caller-facing status label,
//! timing, and a bounded preview of its result or error. Full payloads are
//! never included.

use crate::execution::{ExecutionMap, TaskExecution, TaskStatus};
use crate::graph::Edge;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default maximum preview length in characters
pub const DEFAULT_PREVIEW_LEN: usize = 250;

const ELLIPSIS: &str = "...";

/// One role in the trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceNode {
    /// Role name
    pub role: String,
    /// Display name (`market_analysis` -> `Market Analysis`)
    pub label: String,
    /// Internal status
    pub status: TaskStatus,
    /// Caller-facing status label
    pub status_label: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    /// Truncated result or error
    pub preview: Option<String>,
}

/// Structured trace of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Nodes in declaration order
    pub nodes: Vec<TraceNode>,
    /// Dependency edges
    pub edges: Vec<Edge>,
}

impl TraceRecord {
    /// Look up a node by role
    pub fn node(&self, role: &str) -> Option<&TraceNode> {
        self.nodes.iter().find(|n| n.role == role)
    }
}

/// Build the trace of a run
pub fn build_trace(executions: &ExecutionMap, edges: &[Edge], preview_len: usize) -> TraceRecord {
    TraceRecord {
        nodes: executions
            .iter()
            .map(|exec| trace_node(exec, preview_len))
            .collect(),
        edges: edges.to_vec(),
    }
}

fn trace_node(exec: &TaskExecution, preview_len: usize) -> TraceNode {
    let preview = match (&exec.result, &exec.error) {
        (Some(output), _) => Some(truncate(&output.to_text(), preview_len)),
        (None, Some(error)) => Some(truncate(error, preview_len)),
        (None, None) => None,
    };

    TraceNode {
        role: exec.role.clone(),
        label: title_case(&exec.role),
        status: exec.status,
        status_label: exec.status.label().to_string(),
        started_at: exec.start_time,
        finished_at: exec.end_time,
        duration_ms: exec.duration_ms(),
        preview,
    }
}

/// Title-case a snake_case role name
pub fn title_case(role: &str) -> String {
    role.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate to at most `max_chars` characters, ending in `...` when cut
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars < ELLIPSIS.len() {
        return text.chars().take(max_chars).collect();
    }
    let mut cut: String = text.chars().take(max_chars - ELLIPSIS.len()).collect();
    cut.push_str(ELLIPSIS);
    cut
}
