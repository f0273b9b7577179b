//! HTTP client for a running Quake Query server.

use crate::api::{ErrorBody, QueryResponse};
use crate::{Error, Result};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

pub struct QueryApiClient {
    endpoint: String,
    client: Client,
}

impl QueryApiClient {
    /// `endpoint` is the full URL of the query route, e.g. `http://localhost:8080/query`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client =
            Client::builder().timeout(timeout).build().map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self { endpoint: endpoint.into(), client })
    }

    /// Posts a date range and decodes the success payload.
    ///
    /// A non-200 answer becomes [`Error::Remote`] carrying the server's `error`
    /// string; a transport timeout becomes a `504` remote error.
    pub async fn query(&self, start_date: &str, end_date: &str) -> Result<QueryResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "start_date": start_date, "end_date": end_date }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Remote { status: 504, message: "Request timeout".to_string() }
                } else {
                    Error::Http(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| match body.details {
                    Some(details) => format!("{} ({})", body.error, details),
                    None => body.error,
                })
                .unwrap_or(text);
            return Err(Error::Remote { status: status.as_u16(), message });
        }

        serde_json::from_str(&text)
            .map_err(|e| Error::Http(format!("unexpected response body: {}", e)))
    }
}
