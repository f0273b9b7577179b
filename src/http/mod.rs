//! HTTP API module for Quake Query
//!
//! Provides the inbound query endpoint with its CORS preflight, a health check,
//! and a client for calling a running server.

pub mod client;
pub mod server;

pub use client::QueryApiClient;
pub use server::{create_server, start_server, AppState, ErrorResponse, HealthResponse};
