//! # Quake Query
//!
//! Quake Query serves earthquake event records that a scheduled ingestion job
//! has already normalised into an object store. A client asks for a date range;
//! the service submits a SQL query to an asynchronous query engine (Amazon Athena
//! in production), polls until the execution reaches a terminal state or the wait
//! ceiling is hit, flattens the tabular result into records and answers with a
//! uniform JSON envelope carrying CORS headers.
//!
//! ## Pipeline
//!
//! - [`querying::query_builder`] turns a date range into query text
//! - [`engine::QueryEngine`] submits it and reports status and results
//! - [`execution::poller`] waits for a terminal state under a bounded wait
//! - [`execution::materializer`] zips column labels with row cells
//! - [`api::handler::QueryHandler`] orchestrates the above and maps every outcome
//!   to a [`api::envelope::ResponseEnvelope`]
//!
//! ## Example
//!
//! ```rust
//! use quake_query::Result;
//!
//! fn example() -> Result<()> {
//!     println!("Quake Query service");
//!     Ok(())
//! }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]

/// Request decoding, response envelopes and the request handler
pub mod api;

/// Service configuration
pub mod config;

/// Asynchronous query engine seam and its implementations
pub mod engine;

/// Completion polling and result materialization
pub mod execution;

/// HTTP server and client
pub mod http;

/// Tracing subscriber setup
pub mod logging;

/// Query text construction
pub mod querying;

pub mod error {
    //! Error types and result definitions

    use thiserror::Error;

    /// Result type alias for Quake Query operations
    pub type Result<T> = std::result::Result<T, Error>;

    /// Main error type for Quake Query
    #[derive(Error, Debug)]
    pub enum Error {
        /// Request body could not be parsed as JSON
        #[error("Invalid JSON: {0}")]
        InvalidJson(String),

        /// One or both of the date fields is absent or empty
        #[error("start_date and end_date required")]
        MissingDates,

        /// A date field does not look like `YYYY-MM-DD`
        #[error("Invalid date: {0}")]
        InvalidDate(String),

        /// The engine rejected the query at submission time
        #[error("Query submission failed: {0}")]
        Submission(String),

        /// The execution was still running when the wait ceiling elapsed
        #[error("Query timeout")]
        PollTimeout {
            /// Execution left running on the engine
            execution_id: String,
        },

        /// The execution reached `FAILED` or `CANCELLED`
        #[error("Athena query failed: {state}")]
        QueryFailed {
            /// Terminal state name as reported by the engine
            state: String,
            /// Engine supplied reason, verbatim
            details: String,
        },

        /// Transport or protocol failure while talking to the engine
        #[error("Engine error: {0}")]
        Engine(String),

        /// Transport failure talking to a remote query endpoint
        #[error("HTTP error: {0}")]
        Http(String),

        /// A remote query endpoint answered with a non-success status
        #[error("Remote error ({status}): {message}")]
        Remote {
            /// Status code returned by the remote endpoint
            status: u16,
            /// `error` field of the remote body, or the raw body text
            message: String,
        },

        /// Configuration error
        #[error("Configuration error: {0}")]
        Config(String),

        /// Anything else
        #[error("{0}")]
        Internal(String),
    }

    impl Error {
        /// HTTP status code this error is reported with.
        pub fn status_code(&self) -> u16 {
            if let Error::Remote { status, .. } = self {
                *status
            } else if self.is_client_error() {
                400
            } else {
                500
            }
        }

        /// Whether the caller sent something unusable. Never retried.
        pub fn is_client_error(&self) -> bool {
            matches!(self, Error::InvalidJson(_) | Error::MissingDates | Error::InvalidDate(_))
        }

        /// Message placed in the `error` field of the response body.
        ///
        /// Classified errors keep their own message; anything unclassified is
        /// reported generically with its string form.
        pub fn public_message(&self) -> String {
            match self {
                Error::InvalidJson(_)
                | Error::MissingDates
                | Error::InvalidDate(_)
                | Error::Submission(_)
                | Error::PollTimeout { .. }
                | Error::QueryFailed { .. } => self.to_string(),
                Error::Engine(_)
                | Error::Http(_)
                | Error::Remote { .. }
                | Error::Config(_)
                | Error::Internal(_) => {
                    format!("Internal server error: {}", self)
                }
            }
        }
    }

    impl From<serde_json::Error> for Error {
        fn from(err: serde_json::Error) -> Self {
            Error::Internal(err.to_string())
        }
    }
}

// Re-export commonly used types
pub use error::{Error, Result};
