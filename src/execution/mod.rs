//! Query Execution Module
//!
//! This module drives a submitted execution to a terminal state and turns its
//! output into records.
//!
//! # Components
//!
//! - **poller** - fixed-interval status checks bounded by a wait ceiling
//! - **materializer** - zips column labels with row cells into [`NormalizedRecord`]s
//!
//! # Example
//!
//! ```ignore
//! use quake_query::execution::{await_completion, fetch_records, PollOutcome};
//!
//! match await_completion(&engine, &handle, interval, max_wait).await? {
//!     PollOutcome::Completed(status) if status.state == ExecutionState::Succeeded => {
//!         let records = fetch_records(&engine, &handle).await?;
//!     }
//!     PollOutcome::Completed(status) => { /* FAILED or CANCELLED */ }
//!     PollOutcome::Timeout { .. } => { /* execution left running */ }
//! }
//! ```

pub mod materializer;
pub mod poller;

// Re-export main types for convenience
pub use materializer::{fetch_records, materialize, NormalizedRecord};
pub use poller::{await_completion, PollOutcome};
