//! Request handler
//!
//! Orchestrates one call end to end: preflight short-circuit, body decoding,
//! date validation, query construction, submission, bounded polling and
//! materialization. Every outcome, including a panic inside the pipeline,
//! leaves as a [`ResponseEnvelope`] with the CORS header set.
//!
//! Each call owns its execution handle; nothing is shared between calls apart
//! from the stateless engine client, so concurrent calls poll independently.

use super::envelope::{QueryRequest, QueryResponse, RawRequest, ResponseEnvelope};
use crate::config::QueryConfig;
use crate::engine::{ExecutionState, QueryEngine};
use crate::execution::{await_completion, fetch_records, PollOutcome};
use crate::querying::QueryBuilder;
use crate::{Error, Result};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

pub struct QueryHandler {
    engine: Arc<dyn QueryEngine>,
    builder: QueryBuilder,
    config: QueryConfig,
}

impl QueryHandler {
    pub fn new(engine: Arc<dyn QueryEngine>, config: QueryConfig) -> Result<Self> {
        let builder = QueryBuilder::new(&config)?;
        Ok(QueryHandler { engine, builder, config })
    }

    /// Handles one call. Never fails and never panics past this boundary.
    pub async fn handle(&self, request: RawRequest) -> ResponseEnvelope {
        tracing::info!(method = ?request.method, "received request");

        if request.is_preflight() {
            return ResponseEnvelope::preflight();
        }

        let outcome = AssertUnwindSafe(self.execute(&request)).catch_unwind().await;
        let result = outcome.unwrap_or_else(|panic| Err(Error::Internal(panic_message(panic.as_ref()))));

        match result {
            Ok(response) => {
                tracing::info!(
                    rows = response.count,
                    execution_id = %response.query_execution_id,
                    "returning rows"
                );
                ResponseEnvelope::success(response)
            }
            Err(err) => {
                if err.is_client_error() {
                    tracing::warn!(error = %err, "rejected request");
                } else {
                    tracing::error!(error = ?err, "request failed");
                }
                ResponseEnvelope::from_error(&err)
            }
        }
    }

    async fn execute(&self, request: &RawRequest) -> Result<QueryResponse> {
        let body = request.json_body()?;
        let query_request = QueryRequest::from_json(&body)?;
        self.run(&query_request).await
    }

    /// Runs the query pipeline for an already validated date range.
    #[tracing::instrument(skip(self, request), fields(start_date = %request.start_date, end_date = %request.end_date))]
    pub async fn run(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let query = self.builder.build(&request.start_date, &request.end_date)?;
        tracing::info!(%query, "executing query");

        let handle = self
            .engine
            .submit_query(&query, &self.config.database, &self.config.output_location)
            .await?;
        tracing::info!(execution_id = %handle, "query submitted");

        let outcome = await_completion(
            self.engine.as_ref(),
            &handle,
            self.config.poll_interval,
            self.config.max_wait,
        )
        .await?;

        let status = match outcome {
            PollOutcome::Timeout { .. } => {
                return Err(Error::PollTimeout { execution_id: handle.to_string() })
            }
            PollOutcome::Completed(status) => status,
        };

        if status.state != ExecutionState::Succeeded {
            return Err(Error::QueryFailed {
                state: status.state.to_string(),
                details: status
                    .failure_reason
                    .unwrap_or_else(|| "No additional details".to_string()),
            });
        }

        let records = fetch_records(self.engine.as_ref(), &handle).await?;
        Ok(QueryResponse::new(records, handle))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "request handler panicked".to_string()
    }
}
