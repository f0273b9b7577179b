//! In-memory engine with a scripted status sequence
//!
//! Each `get_status` call consumes the next scripted status; the last one
//! repeats forever, so a script of `[Running]` never finishes and a script of
//! `[Succeeded]` finishes on the first check. Every call is recorded so tests
//! can assert what the handler did and did not ask for.

use super::{ExecutionHandle, ExecutionState, ExecutionStatus, QueryEngine, ResultSet};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A call the engine received, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Submit { query: String, database: String, output_location: String },
    Status(ExecutionHandle),
    Results(ExecutionHandle),
}

struct Script {
    submit_error: Option<String>,
    statuses: VecDeque<ExecutionStatus>,
    results: ResultSet,
    results_error: Option<String>,
    submissions: u64,
    calls: Vec<EngineCall>,
}

pub struct ScriptedEngine {
    script: Mutex<Script>,
}

impl ScriptedEngine {
    /// Engine whose executions succeed on the first status check and return `results`.
    pub fn succeeding(results: ResultSet) -> Self {
        Self::with_statuses(vec![ExecutionStatus::new(ExecutionState::Succeeded)], results)
    }

    /// Engine whose executions never leave `RUNNING`.
    pub fn always_running() -> Self {
        Self::with_statuses(vec![ExecutionStatus::new(ExecutionState::Running)], ResultSet::default())
    }

    /// Engine that rejects every submission with `reason`.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        let engine = Self::always_running();
        engine.lock().submit_error = Some(reason.into());
        engine
    }

    pub fn with_statuses(statuses: Vec<ExecutionStatus>, results: ResultSet) -> Self {
        Self {
            script: Mutex::new(Script {
                submit_error: None,
                statuses: statuses.into(),
                results,
                results_error: None,
                submissions: 0,
                calls: Vec::new(),
            }),
        }
    }

    /// Makes `get_results` fail with a transport error.
    pub fn failing_results(self, reason: impl Into<String>) -> Self {
        self.lock().results_error = Some(reason.into());
        self
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.lock().calls.clone()
    }

    pub fn status_checks(&self) -> usize {
        self.lock().calls.iter().filter(|call| matches!(call, EngineCall::Status(_))).count()
    }

    pub fn result_fetches(&self) -> usize {
        self.lock().calls.iter().filter(|call| matches!(call, EngineCall::Results(_))).count()
    }

    /// Query texts submitted so far.
    pub fn submitted_queries(&self) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::Submit { query, .. } => Some(query.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl QueryEngine for ScriptedEngine {
    async fn submit_query(
        &self,
        query: &str,
        database: &str,
        output_location: &str,
    ) -> Result<ExecutionHandle> {
        let mut script = self.lock();
        script.calls.push(EngineCall::Submit {
            query: query.to_string(),
            database: database.to_string(),
            output_location: output_location.to_string(),
        });

        if let Some(reason) = &script.submit_error {
            return Err(Error::Submission(reason.clone()));
        }

        script.submissions += 1;
        Ok(ExecutionHandle::new(format!("scripted-{}", script.submissions)))
    }

    async fn get_status(&self, handle: &ExecutionHandle) -> Result<ExecutionStatus> {
        let mut script = self.lock();
        script.calls.push(EngineCall::Status(handle.clone()));

        let status = if script.statuses.len() > 1 {
            script.statuses.pop_front()
        } else {
            script.statuses.front().cloned()
        };
        status.ok_or_else(|| Error::Engine(format!("no status scripted for {}", handle)))
    }

    async fn get_results(&self, handle: &ExecutionHandle) -> Result<ResultSet> {
        let mut script = self.lock();
        script.calls.push(EngineCall::Results(handle.clone()));

        match &script.results_error {
            Some(reason) => Err(Error::Engine(reason.clone())),
            None => Ok(script.results.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_last_status_repeats() {
        let engine = ScriptedEngine::with_statuses(
            vec![
                ExecutionStatus::new(ExecutionState::Running),
                ExecutionStatus::new(ExecutionState::Succeeded),
            ],
            ResultSet::default(),
        );
        let handle = engine.submit_query("SELECT 1", "db", "s3://out/").await.unwrap();

        assert_eq!(engine.get_status(&handle).await.unwrap().state, ExecutionState::Running);
        assert_eq!(engine.get_status(&handle).await.unwrap().state, ExecutionState::Succeeded);
        assert_eq!(engine.get_status(&handle).await.unwrap().state, ExecutionState::Succeeded);
        assert_eq!(engine.status_checks(), 3);
    }

    #[tokio::test]
    async fn test_each_submission_gets_a_fresh_handle() {
        let engine = ScriptedEngine::succeeding(ResultSet::default());
        let first = engine.submit_query("q", "db", "s3://out/").await.unwrap();
        let second = engine.submit_query("q", "db", "s3://out/").await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_rejecting_engine_records_the_attempt() {
        let engine = ScriptedEngine::rejecting("database does not exist");
        let err = engine.submit_query("q", "missing_db", "s3://out/").await.unwrap_err();
        assert!(matches!(err, Error::Submission(ref reason) if reason == "database does not exist"));
        assert_eq!(engine.submitted_queries(), vec!["q".to_string()]);
    }
}
