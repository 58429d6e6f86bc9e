//! End-to-end performance run.
//!
//! launches → close driver → stop session → settle → poll telemetry →
//! evaluate → write report. Everything after driver creation degrades
//! instead of failing; only the report write can still error.

use std::path::{Path, PathBuf};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::client::SessionApi;
use crate::config::RunConfig;
use crate::driver::{AutomationDriver, DriverSession};
use crate::error::GridResult;
use crate::launch::{run_cold_launches, LaunchResults};
use crate::poll::{poll_for_profiling, wait_for_completion};
use crate::report::{write_report, Evaluation, PerformanceReport};
use crate::types::SessionSnapshot;

/// A finished run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: PerformanceReport,
    pub report_path: PathBuf,
    /// Whether profiling data was found while polling.
    pub profiling_ready: bool,
}

impl RunOutcome {
    pub fn passed(&self) -> bool {
        self.report.passed()
    }
}

pub struct PerformanceRun<'a, S: SessionApi + ?Sized> {
    api: &'a S,
    config: &'a RunConfig,
    output_dir: PathBuf,
}

impl<'a, S: SessionApi + ?Sized> PerformanceRun<'a, S> {
    pub fn new(api: &'a S, config: &'a RunConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            api,
            config,
            output_dir: output_dir.into(),
        }
    }

    /// Run the launch loop on an already created driver, then collect and report.
    ///
    /// The driver is quit before any telemetry call.
    pub async fn execute<D: AutomationDriver>(&self, driver: D) -> GridResult<RunOutcome> {
        let mut session = DriverSession::new(driver);
        let session_id = session.session_id().to_string();
        info!(session_id = %session_id, "performance run started");

        let launches = run_cold_launches(
            session.driver(),
            &self.config.app.package,
            &self.config.launch,
        )
        .await;
        session.close().await;

        self.collect(&session_id, launches).await
    }

    /// Stop the session, wait for telemetry and write the report.
    pub async fn collect(&self, session_id: &str, launches: LaunchResults) -> GridResult<RunOutcome> {
        self.stop_best_effort(session_id).await;

        let policy = &self.config.polling;
        let settle = policy.termination_settle();
        if !settle.is_zero() {
            info!(
                session_id,
                wait_secs = settle.as_secs_f64(),
                "waiting for the session to terminate"
            );
            sleep(settle).await;
        }

        if policy.await_completion && !wait_for_completion(self.api, session_id, policy).await {
            warn!(session_id, "session did not report completion, collecting anyway");
        }

        let poll = poll_for_profiling(self.api, session_id, policy).await;
        let mut outcome = self.finish(session_id, &launches, poll.snapshot)?;
        outcome.profiling_ready = poll.profiling_ready;
        Ok(outcome)
    }

    /// Evaluate a snapshot (possibly none) and write the report.
    pub fn finish(
        &self,
        session_id: &str,
        launches: &LaunchResults,
        snapshot: Option<SessionSnapshot>,
    ) -> GridResult<RunOutcome> {
        report_run(self.config, &self.output_dir, session_id, launches, snapshot)
    }

    async fn stop_best_effort(&self, session_id: &str) {
        match self.api.stop_session(session_id).await {
            Ok(true) => {}
            Ok(false) => warn!(session_id, "session stop refused, the grid will time it out"),
            Err(e) => warn!(session_id, error = %e, "session stop failed"),
        }
    }
}

/// Evaluate a snapshot (possibly none) against `config` and write the report
/// into `output_dir`. No network access.
pub fn report_run(
    config: &RunConfig,
    output_dir: &Path,
    session_id: &str,
    launches: &LaunchResults,
    snapshot: Option<SessionSnapshot>,
) -> GridResult<RunOutcome> {
    if snapshot.is_none() {
        warn!(session_id, "no telemetry fetched, writing a degraded report");
    }
    let profiling_ready = snapshot
        .as_ref()
        .is_some_and(SessionSnapshot::has_profiling_data);
    let evaluation = Evaluation::new(snapshot.as_ref(), launches, &config.thresholds);
    let report = PerformanceReport::new(
        session_id,
        launches,
        evaluation,
        snapshot,
        &config.app,
        &config.thresholds,
    );
    let report_path = write_report(&report, output_dir)?;

    info!(
        session_id,
        passed = report.passed(),
        checks_passed = report.verdict().passed_checks(),
        "performance run evaluated"
    );
    Ok(RunOutcome {
        report,
        report_path,
        profiling_ready,
    })
}
