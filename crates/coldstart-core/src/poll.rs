//! Waiting for server-side telemetry to appear.
//!
//! Profiling data is produced asynchronously after a session ends. The
//! poller waits an initial delay, then fetches up to `max_attempts` times
//! with a delay that grows by `growth_factor` between attempts.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::client::SessionApi;
use crate::config::PollPolicy;
use crate::session::SessionStatus;
use crate::types::SessionSnapshot;

/// Result of availability polling. Never an error: exhaustion degrades.
#[derive(Debug, Clone)]
pub struct PollOutcome {
    /// Last snapshot fetched, `None` when every attempt failed.
    pub snapshot: Option<SessionSnapshot>,
    /// Fetch attempts performed.
    pub attempts: u32,
    /// Whether profiling data was found.
    pub profiling_ready: bool,
}

/// Poll until the profiling payload has `meta`, `cpu` or `mem` data.
pub async fn poll_for_profiling<S>(api: &S, session_id: &str, policy: &PollPolicy) -> PollOutcome
where
    S: SessionApi + ?Sized,
{
    let max_attempts = policy.max_attempts.max(1);

    let initial = policy.initial_delay();
    if !initial.is_zero() {
        info!(
            session_id,
            wait_secs = initial.as_secs_f64(),
            "waiting for the grid to process session data"
        );
        sleep(initial).await;
    }

    let mut last: Option<SessionSnapshot> = None;

    for attempt in 1..=max_attempts {
        debug!(session_id, attempt, max_attempts, "fetching session telemetry");

        match api.fetch_snapshot(session_id).await {
            Ok(snapshot) => {
                let ready = snapshot.has_profiling_data();
                last = Some(snapshot);
                if ready {
                    info!(session_id, attempt, "profiling metrics available");
                    return PollOutcome {
                        snapshot: last,
                        attempts: attempt,
                        profiling_ready: true,
                    };
                }
                warn!(session_id, attempt, "profiling data not yet available");
            }
            Err(e) if !e.is_retryable() => {
                warn!(session_id, attempt, error = %e, "telemetry fetch failed, not retrying");
                return PollOutcome {
                    snapshot: last,
                    attempts: attempt,
                    profiling_ready: false,
                };
            }
            Err(e) => {
                warn!(session_id, attempt, error = %e, "telemetry fetch failed");
            }
        }

        if attempt < max_attempts {
            let delay = policy.backoff_delay(attempt);
            debug!(
                session_id,
                attempt,
                delay_secs = delay.as_secs_f64(),
                "retrying after backoff"
            );
            sleep(delay).await;
        }
    }

    warn!(
        session_id,
        attempts = max_attempts,
        "profiling data not available, proceeding with what was fetched"
    );
    PollOutcome {
        snapshot: last,
        attempts: max_attempts,
        profiling_ready: false,
    }
}

/// Wait until the grid reports the session `completed` (true) or `failed`
/// (false). Errors and timeouts are logged and yield false.
pub async fn wait_for_completion<S>(api: &S, session_id: &str, policy: &PollPolicy) -> bool
where
    S: SessionApi + ?Sized,
{
    let timeout = policy.completion_timeout();
    let interval = policy.completion_interval().max(Duration::from_millis(1));
    let started = Instant::now();

    loop {
        match api.session_details(session_id).await {
            Ok(Ok(details)) => match SessionStatus::from_details(&details) {
                SessionStatus::Completed => {
                    info!(session_id, "session completed");
                    return true;
                }
                SessionStatus::Failed => {
                    warn!(session_id, "session failed");
                    return false;
                }
                SessionStatus::Running(state) => {
                    debug!(session_id, state = %state, "session still running");
                }
                SessionStatus::Unknown => {
                    debug!(session_id, "session status not reported");
                }
            },
            Ok(Err(unavailable)) => debug!(session_id, reason = %unavailable, "status unavailable"),
            Err(e) => warn!(session_id, error = %e, "error checking session status"),
        }

        if started.elapsed() + interval > timeout {
            warn!(
                session_id,
                timeout_secs = timeout.as_secs_f64(),
                "timed out waiting for session completion"
            );
            return false;
        }
        sleep(interval).await;
    }
}
