//! Amazon Athena adapter
//!
//! Maps the three engine operations onto `StartQueryExecution`,
//! `GetQueryExecution` and `GetQueryResults`. Result pages are followed through
//! `NextToken`; Athena puts the header row at the top of the first page of a
//! `SELECT` result and never repeats it.

use super::{ExecutionHandle, ExecutionState, ExecutionStatus, QueryEngine, ResultSet};
use crate::config::QueryConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_athena::config::Region;
use aws_sdk_athena::error::DisplayErrorContext;
use aws_sdk_athena::types::{
    QueryExecutionContext, QueryExecutionState, ResultConfiguration,
    ResultSet as AthenaResultSet,
};
use aws_sdk_athena::Client;

#[derive(Clone)]
pub struct AthenaEngine {
    client: Client,
}

impl AthenaEngine {
    /// Loads credentials from the default provider chain for the configured region.
    #[tracing::instrument(level = "debug", skip(config), fields(region = %config.region))]
    pub async fn new(config: &QueryConfig) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let shared = loader.load().await;
        Self { client: Client::new(&shared) }
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QueryEngine for AthenaEngine {
    #[tracing::instrument(level = "debug", skip(self, query))]
    async fn submit_query(
        &self,
        query: &str,
        database: &str,
        output_location: &str,
    ) -> Result<ExecutionHandle> {
        let context = QueryExecutionContext::builder().database(database).build();
        let result_config = ResultConfiguration::builder().output_location(output_location).build();

        let response = self
            .client
            .start_query_execution()
            .query_string(query)
            .query_execution_context(context)
            .result_configuration(result_config)
            .send()
            .await
            .map_err(|e| Error::Submission(DisplayErrorContext(&e).to_string()))?;

        response
            .query_execution_id()
            .map(ExecutionHandle::new)
            .ok_or_else(|| Error::Submission("engine returned no execution id".to_string()))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_status(&self, handle: &ExecutionHandle) -> Result<ExecutionStatus> {
        let response = self
            .client
            .get_query_execution()
            .query_execution_id(handle.as_str())
            .send()
            .await
            .map_err(|e| Error::Engine(DisplayErrorContext(&e).to_string()))?;

        let status = response.query_execution().and_then(|q| q.status()).ok_or_else(|| {
            Error::Engine(format!("no status reported for execution {}", handle))
        })?;

        Ok(ExecutionStatus {
            state: map_state(status.state())?,
            failure_reason: status.state_change_reason().map(str::to_string),
        })
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_results(&self, handle: &ExecutionHandle) -> Result<ResultSet> {
        let mut result = ResultSet { has_header_row: true, ..ResultSet::default() };
        let mut next_token: Option<String> = None;
        let mut first = true;

        loop {
            let response = self
                .client
                .get_query_results()
                .query_execution_id(handle.as_str())
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| Error::Engine(DisplayErrorContext(&e).to_string()))?;

            if let Some(page) = response.result_set() {
                append_page(&mut result, page, first);
            }
            first = false;

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        tracing::debug!(rows = result.rows.len(), "fetched result pages");
        Ok(result)
    }
}

/// `QUEUED` is folded into `RUNNING`; an absent state means the engine has not
/// reported one yet.
fn map_state(state: Option<&QueryExecutionState>) -> Result<ExecutionState> {
    match state {
        None | Some(QueryExecutionState::Queued | QueryExecutionState::Running) => {
            Ok(ExecutionState::Running)
        }
        Some(QueryExecutionState::Succeeded) => Ok(ExecutionState::Succeeded),
        Some(QueryExecutionState::Failed) => Ok(ExecutionState::Failed),
        Some(QueryExecutionState::Cancelled) => Ok(ExecutionState::Cancelled),
        Some(other) => {
            Err(Error::Engine(format!("unrecognised execution state '{}'", other.as_str())))
        }
    }
}

/// Columns come from the first page only; later pages contribute rows in the
/// order they were fetched.
fn append_page(result: &mut ResultSet, page: &AthenaResultSet, first: bool) {
    if first {
        result.columns = column_labels(page);
    }
    result.rows.extend(page_rows(page));
}

fn column_labels(page: &AthenaResultSet) -> Vec<String> {
    page.result_set_metadata()
        .map(|metadata| {
            metadata
                .column_info()
                .iter()
                .map(|column| column.label().unwrap_or_else(|| column.name()).to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn page_rows(page: &AthenaResultSet) -> Vec<Vec<Option<String>>> {
    page.rows()
        .iter()
        .map(|row| row.data().iter().map(|datum| datum.var_char_value().map(str::to_string)).collect())
        .collect()
}
