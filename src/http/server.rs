//! HTTP API Server for Quake Query
//!
//! Exposes the request handler over HTTP. The handler owns CORS: it answers
//! `OPTIONS` itself and stamps the fixed header set on every response, so the
//! router only forwards method and body.

use crate::api::{QueryHandler, RawRequest, RequestBody, ResponseEnvelope};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Error response for requests that never reach the handler
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Shared application state
pub struct AppState {
    pub handler: Arc<QueryHandler>,
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = match self.body_text() {
            Ok(text) => (status, text).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode response body");
                let body = Json(ErrorResponse { error: format!("Internal server error: {}", e) });
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        };

        for (name, value) in &self.headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().insert(name, value);
                }
                _ => tracing::warn!(header = %name, "skipping invalid response header"),
            }
        }

        response
    }
}

/// Create the HTTP server with all routes
pub fn create_server(handler: Arc<QueryHandler>) -> Router {
    let state = Arc::new(AppState { handler });

    Router::new()
        .route("/", any(run_query))
        .route("/query", any(run_query))
        .route("/health", get(health_check))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse { status: "healthy".to_string() })
}

async fn not_found() -> Response {
    ResponseEnvelope::not_found("API endpoint not found").into_response()
}

/// ANY /query - Run a date-range query; the handler answers `OPTIONS` itself
/// and treats every other method as a query call
async fn run_query(State(state): State<Arc<AppState>>, method: Method, body: Bytes) -> Response {
    let request = RawRequest::new(
        Some(method.as_str().to_string()),
        RequestBody::Bytes(body.to_vec()),
    );
    state.handler.handle(request).await.into_response()
}

/// Start the HTTP server on the given address
pub async fn start_server(
    addr: &str,
    handler: Arc<QueryHandler>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_server(handler);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Quake Query HTTP API listening on http://{}", addr);
    tracing::info!("  POST    /query   - Run a date-range query");
    tracing::info!("  OPTIONS /query   - CORS preflight");
    tracing::info!("  GET     /health  - Health check");

    axum::serve(listener, app).await?;

    Ok(())
}
