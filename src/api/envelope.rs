//! Request decoding and the response envelope.

use crate::engine::ExecutionHandle;
use crate::execution::NormalizedRecord;
use crate::{Error, Result};
use serde::ser::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Headers carried by every response, success or error.
pub const CORS_HEADERS: [(&str, &str); 4] = [
    ("Content-Type", "application/json"),
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Headers", "Content-Type"),
    ("Access-Control-Allow-Methods", "POST, OPTIONS"),
];

/// Body of an incoming call: raw text, raw bytes off the wire, or an already
/// decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Text(String),
    Bytes(Vec<u8>),
    Json(Value),
}

/// An incoming call before any validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRequest {
    pub method: Option<String>,
    pub body: RequestBody,
}

impl RawRequest {
    pub fn new(method: Option<String>, body: RequestBody) -> Self {
        Self { method, body }
    }

    pub fn post(body: impl Into<String>) -> Self {
        Self::new(Some("POST".to_string()), RequestBody::Text(body.into()))
    }

    pub fn options() -> Self {
        Self::new(Some("OPTIONS".to_string()), RequestBody::Text(String::new()))
    }

    /// Decodes a function-URL or gateway style invocation event.
    ///
    /// The method is read from `requestContext.http.method` or `httpMethod`.
    /// A string `body` field is the raw request body; an event without a
    /// `body` field is a direct invocation and is itself the payload.
    pub fn from_event(event: Value) -> Self {
        let method = event
            .pointer("/requestContext/http/method")
            .or_else(|| event.get("httpMethod"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let body = match event.get("body") {
            Some(Value::String(text)) => RequestBody::Text(text.clone()),
            Some(Value::Null) => RequestBody::Text(String::new()),
            Some(other) => RequestBody::Json(other.clone()),
            None => RequestBody::Json(event),
        };

        Self { method, body }
    }

    pub fn is_preflight(&self) -> bool {
        self.method.as_deref().is_some_and(|m| m.eq_ignore_ascii_case("OPTIONS"))
    }

    /// Parses the body; malformed text is a client error.
    pub fn json_body(&self) -> Result<Value> {
        match &self.body {
            RequestBody::Text(text) => {
                serde_json::from_str(text).map_err(|e| Error::InvalidJson(e.to_string()))
            }
            RequestBody::Bytes(bytes) => {
                serde_json::from_slice(bytes).map_err(|e| Error::InvalidJson(e.to_string()))
            }
            RequestBody::Json(value) => Ok(value.clone()),
        }
    }
}

/// Validated date range of one call. Bounds are passed to the engine as given;
/// `start_date > end_date` is not rejected here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub start_date: String,
    pub end_date: String,
}

impl QueryRequest {
    /// Reads both dates from a decoded body. Absent, empty or non-string fields
    /// (and bodies that are not objects) are all [`Error::MissingDates`].
    pub fn from_json(body: &Value) -> Result<Self> {
        let field = |name: &str| {
            body.get(name).and_then(Value::as_str).filter(|v| !v.is_empty()).map(str::to_string)
        };

        match (field("start_date"), field("end_date")) {
            (Some(start_date), Some(end_date)) => Ok(Self { start_date, end_date }),
            _ => Err(Error::MissingDates),
        }
    }
}

/// Successful query payload.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QueryResponse {
    pub data: Vec<NormalizedRecord>,
    pub count: usize,
    pub query_execution_id: ExecutionHandle,
}

impl QueryResponse {
    pub fn new(data: Vec<NormalizedRecord>, query_execution_id: ExecutionHandle) -> Self {
        Self { count: data.len(), data, query_execution_id }
    }
}

/// Error payload. `details` only appears for failed or cancelled executions.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A response never carries both data and an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Preflight answer, serialized as an empty string
    Empty,
    Success(QueryResponse),
    Error(ErrorBody),
}

impl Serialize for ResponseBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ResponseBody::Empty => serializer.serialize_str(""),
            ResponseBody::Success(response) => response.serialize(serializer),
            ResponseBody::Error(error) => error.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: ResponseBody,
}

impl ResponseEnvelope {
    fn with_body(status_code: u16, body: ResponseBody) -> Self {
        let headers =
            CORS_HEADERS.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        Self { status_code, headers, body }
    }

    pub fn preflight() -> Self {
        Self::with_body(200, ResponseBody::Empty)
    }

    pub fn success(response: QueryResponse) -> Self {
        Self::with_body(200, ResponseBody::Success(response))
    }

    pub fn from_error(err: &Error) -> Self {
        let details = match err {
            Error::QueryFailed { details, .. } => Some(details.clone()),
            _ => None,
        };
        Self::with_body(
            err.status_code(),
            ResponseBody::Error(ErrorBody { error: err.public_message(), details }),
        )
    }

    /// Answer for a route the service does not serve.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_body(404, ResponseBody::Error(ErrorBody { error: message.into(), details: None }))
    }

    /// Body as the text written on the wire.
    pub fn body_text(&self) -> Result<String> {
        match &self.body {
            ResponseBody::Empty => Ok(String::new()),
            ResponseBody::Success(response) => Ok(serde_json::to_string(response)?),
            ResponseBody::Error(error) => Ok(serde_json::to_string(error)?),
        }
    }

    /// Gateway proxy shape: same envelope with the body as a JSON string.
    pub fn to_proxy_response(&self) -> Result<Value> {
        Ok(serde_json::json!({
            "statusCode": self.status_code,
            "headers": self.headers,
            "body": self.body_text()?,
        }))
    }
}
