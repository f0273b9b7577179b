//! Completion poller
//!
//! Checks the execution status at a fixed interval until a terminal state is
//! observed or the accumulated wait reaches `max_wait`. Engine queries finish
//! in a few seconds, so a fixed interval with a hard ceiling gives a
//! predictable worst-case latency.
//!
//! A timed-out execution is not cancelled; it keeps running until the engine
//! reclaims it. Only the calling request is suspended while polling, and
//! dropping the future abandons the loop without touching the engine.

use crate::engine::{ExecutionHandle, ExecutionStatus, QueryEngine};
use crate::{Error, Result};
use std::time::Duration;

/// How a poll cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A terminal status was observed
    Completed(ExecutionStatus),
    /// `max_wait` elapsed while the execution was still running
    Timeout { elapsed: Duration },
}

/// Polls `handle` until it leaves `RUNNING` or `max_wait` is used up.
///
/// Checks happen at elapsed `0, interval, 2·interval, …` while the elapsed
/// time is below `max_wait`; once it reaches the ceiling the outcome is
/// [`PollOutcome::Timeout`] without a further check. Status-check failures are
/// returned immediately.
#[tracing::instrument(level = "debug", skip(engine))]
pub async fn await_completion(
    engine: &dyn QueryEngine,
    handle: &ExecutionHandle,
    poll_interval: Duration,
    max_wait: Duration,
) -> Result<PollOutcome> {
    if poll_interval.is_zero() {
        return Err(Error::Config("poll interval must be positive".to_string()));
    }

    let mut elapsed = Duration::ZERO;
    while elapsed < max_wait {
        let status = engine.get_status(handle).await?;
        if status.state.is_terminal() {
            tracing::debug!(state = %status.state, ?elapsed, "execution reached terminal state");
            return Ok(PollOutcome::Completed(status));
        }

        tokio::time::sleep(poll_interval).await;
        elapsed += poll_interval;
    }

    tracing::warn!(execution_id = %handle, ?elapsed, "execution still running at wait ceiling");
    Ok(PollOutcome::Timeout { elapsed })
}
