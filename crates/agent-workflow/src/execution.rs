//! Per-run task execution records

use crate::error::{Result, WorkflowError};
use agent_core::TaskOutput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of one task within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started yet
    #[default]
    Pending,
    /// Submitted to the worker pool
    Running,
    /// Finished with a result
    Completed,
    /// Finished with an error
    Failed,
    /// Never run because an upstream dependency did not complete
    Skipped,
}

impl TaskStatus {
    /// Whether the status is final
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }

    /// Caller-facing label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Waiting",
            Self::Running => "In Progress",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Skipped => "Skipped",
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution record of one role in one run
///
/// Status only moves forward: `pending -> running -> completed | failed`,
/// or `pending -> skipped`. Terminal records are never modified again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskExecution {
    /// Role this record belongs to
    pub role: String,
    /// Current status
    pub status: TaskStatus,
    /// When the provider call began
    ///
    /// Set to the submission time when the task starts running, then
    /// replaced by the worker's own timestamp once it reports back.
    pub start_time: Option<DateTime<Utc>>,
    /// When the task reached a terminal state
    pub end_time: Option<DateTime<Utc>>,
    /// Output of a completed task
    pub result: Option<TaskOutput>,
    /// Failure or skip reason
    pub error: Option<String>,
}

impl TaskExecution {
    /// Create a pending record
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            status: TaskStatus::Pending,
            start_time: None,
            end_time: None,
            result: None,
            error: None,
        }
    }

    fn transition(&mut self, to: TaskStatus) -> Result<()> {
        let allowed = matches!(
            (self.status, to),
            (TaskStatus::Pending, TaskStatus::Running | TaskStatus::Skipped)
                | (TaskStatus::Running, TaskStatus::Completed | TaskStatus::Failed)
        );
        if !allowed {
            return Err(WorkflowError::InvalidTransition {
                role: self.role.clone(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Mark the task running
    pub fn start(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.transition(TaskStatus::Running)?;
        self.start_time = Some(at);
        Ok(())
    }

    /// Mark the task completed with its output
    pub fn complete(&mut self, output: TaskOutput, at: DateTime<Utc>) -> Result<()> {
        self.transition(TaskStatus::Completed)?;
        self.end_time = Some(at);
        self.result = Some(output);
        Ok(())
    }

    /// Mark the task failed
    pub fn fail(&mut self, error: impl Into<String>, at: DateTime<Utc>) -> Result<()> {
        self.transition(TaskStatus::Failed)?;
        self.end_time = Some(at);
        self.error = Some(error.into());
        Ok(())
    }

    /// Mark the task skipped without running it
    pub fn skip(&mut self, reason: impl Into<String>) -> Result<()> {
        self.transition(TaskStatus::Skipped)?;
        self.error = Some(reason.into());
        Ok(())
    }

    /// Wall-clock duration of a finished task
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }
}

/// Execution records of a run, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMap {
    records: Vec<TaskExecution>,
}

impl ExecutionMap {
    /// Create pending records for the given roles
    pub fn pending<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            records: roles.into_iter().map(TaskExecution::new).collect(),
        }
    }

    /// Look up a record by role
    pub fn get(&self, role: &str) -> Option<&TaskExecution> {
        self.records.iter().find(|r| r.role == role)
    }

    /// Look up a record by role for mutation
    pub fn get_mut(&mut self, role: &str) -> Option<&mut TaskExecution> {
        self.records.iter_mut().find(|r| r.role == role)
    }

    /// Status of a role
    pub fn status(&self, role: &str) -> Option<TaskStatus> {
        self.get(role).map(|r| r.status)
    }

    /// Records in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &TaskExecution> {
        self.records.iter()
    }

    /// Number of records with the given status
    pub fn count(&self, status: TaskStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }

    /// Whether every record is terminal
    pub fn all_terminal(&self) -> bool {
        self.records.iter().all(|r| r.status.is_terminal())
    }

    /// Get the number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if there are no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_lifecycle() {
        let mut exec = TaskExecution::new("market_analysis");
        let start = Utc::now();
        exec.start(start).unwrap();
        assert_eq!(exec.status, TaskStatus::Running);

        let end = start + chrono::Duration::milliseconds(1500);
        exec.complete(TaskOutput::Text("bullish".to_string()), end).unwrap();

        assert_eq!(exec.status, TaskStatus::Completed);
        assert_eq!(exec.duration_ms(), Some(1500));
        assert!(exec.error.is_none());
    }

    #[test]
    fn test_skip_never_runs() {
        let mut exec = TaskExecution::new("synthesis");
        exec.skip("dependency 'market_analysis' failed").unwrap();

        assert_eq!(exec.status, TaskStatus::Skipped);
        assert!(exec.start_time.is_none());
        assert!(exec.duration_ms().is_none());
        assert!(exec.start(Utc::now()).is_err());
    }

    #[test]
    fn test_terminal_records_are_frozen() {
        let mut exec = TaskExecution::new("a");
        exec.start(Utc::now()).unwrap();
        exec.fail("rate limited", Utc::now()).unwrap();

        let err = exec.complete(TaskOutput::Text("late".to_string()), Utc::now());
        assert!(matches!(
            err,
            Err(WorkflowError::InvalidTransition {
                from: TaskStatus::Failed,
                to: TaskStatus::Completed,
                ..
            })
        ));
        assert_eq!(exec.error.as_deref(), Some("rate limited"));
        assert!(exec.result.is_none());
    }

    #[test]
    fn test_pending_cannot_complete() {
        let mut exec = TaskExecution::new("a");
        assert!(exec.complete(TaskOutput::Text(String::new()), Utc::now()).is_err());
        assert_eq!(exec.status, TaskStatus::Pending);
    }

    #[test]
    fn test_labels() {
        assert_eq!(TaskStatus::Running.label(), "In Progress");
        assert_eq!(TaskStatus::Pending.label(), "Waiting");
        assert_eq!(TaskStatus::Skipped.to_string(), "skipped");
    }

    #[test]
    fn test_execution_map() {
        let mut map = ExecutionMap::pending(["a", "b"]);
        map.get_mut("a").unwrap().skip("test").unwrap();

        assert_eq!(map.status("a"), Some(TaskStatus::Skipped));
        assert_eq!(map.count(TaskStatus::Pending), 1);
        assert!(!map.all_terminal());
        assert_eq!(
            map.iter().map(|r| r.role.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }
}
