//! Asynchronous query engine seam
//!
//! The handler talks to the engine through exactly three operations: submit a
//! query, check an execution's status, and fetch a finished execution's rows.
//! Keeping the surface this narrow lets the poll state machine run unchanged
//! against Athena in production and against [`ScriptedEngine`] in tests.
//!
//! # Components
//!
//! - **QueryEngine** - the three-operation trait
//! - **AthenaEngine** - Amazon Athena through the AWS SDK
//! - **ScriptedEngine** - in-memory engine with scripted status and results

pub mod athena;
pub mod scripted;

pub use athena::AthenaEngine;
pub use scripted::{EngineCall, ScriptedEngine};

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of one asynchronous query run.
///
/// Owned by the request that submitted it and never reused across requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionHandle(String);

impl ExecutionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        ExecutionHandle(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of an execution. `Running` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionState {
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl ExecutionState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ExecutionState::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionState::Running => "RUNNING",
            ExecutionState::Succeeded => "SUCCEEDED",
            ExecutionState::Failed => "FAILED",
            ExecutionState::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One status observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionStatus {
    pub state: ExecutionState,
    /// Engine supplied reason for the last state change, if any
    pub failure_reason: Option<String>,
}

impl ExecutionStatus {
    pub fn new(state: ExecutionState) -> Self {
        Self { state, failure_reason: None }
    }

    pub fn with_reason(state: ExecutionState, reason: impl Into<String>) -> Self {
        Self { state, failure_reason: Some(reason.into()) }
    }
}

/// Tabular output of a succeeded execution, pages already concatenated in
/// retrieval order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    /// Column labels from the result metadata
    pub columns: Vec<String>,
    /// Rows in engine order; `None` marks an absent cell
    pub rows: Vec<Vec<Option<String>>>,
    /// Whether `rows[0]` is the header row of column labels rather than data.
    /// Only the first page can carry it.
    pub has_header_row: bool,
}

#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Starts an execution. Rejections surface as [`crate::Error::Submission`]
    /// and are never retried, since a blind retry would start a second run.
    async fn submit_query(
        &self,
        query: &str,
        database: &str,
        output_location: &str,
    ) -> Result<ExecutionHandle>;

    async fn get_status(&self, handle: &ExecutionHandle) -> Result<ExecutionStatus>;

    /// Fetches the rows of a `SUCCEEDED` execution.
    async fn get_results(&self, handle: &ExecutionHandle) -> Result<ResultSet>;
}
