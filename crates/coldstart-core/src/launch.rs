//! Repeated cold launches of the app under test.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::LaunchConfig;
use crate::driver::AutomationDriver;
use crate::error::GridResult;

/// Outcome of one cold launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchAttempt {
    /// 1-based.
    pub iteration: u32,
    /// The loaded marker appeared before the timeout.
    pub success: bool,
    /// From activation until the marker appeared or the wait gave up.
    /// 0 when a driver command failed.
    pub elapsed_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Statistics over successful launch times (ms).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchStats {
    pub times: Vec<f64>,
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
    /// Sample standard deviation; 0 with fewer than two samples.
    pub standard_deviation: f64,
    pub count: usize,
}

impl LaunchStats {
    pub fn from_times(times: Vec<f64>) -> Self {
        let count = times.len();
        if count == 0 {
            return Self {
                times,
                average: 0.0,
                minimum: 0.0,
                maximum: 0.0,
                standard_deviation: 0.0,
                count,
            };
        }

        let average = times.iter().sum::<f64>() / count as f64;
        let minimum = times.iter().copied().fold(f64::INFINITY, f64::min);
        let maximum = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let standard_deviation = if count > 1 {
            let var = times.iter().map(|t| (t - average).powi(2)).sum::<f64>() / (count - 1) as f64;
            var.sqrt()
        } else {
            0.0
        };

        Self {
            times,
            average,
            minimum,
            maximum,
            standard_deviation,
            count,
        }
    }

    pub fn from_attempts(attempts: &[LaunchAttempt]) -> Self {
        Self::from_times(
            attempts
                .iter()
                .filter(|a| a.success)
                .map(|a| a.elapsed_ms)
                .collect(),
        )
    }
}

/// All attempts of one launch loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchResults {
    pub target_launches: u32,
    pub attempts: Vec<LaunchAttempt>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl LaunchResults {
    /// Counts only, for analysing a session whose launches ran elsewhere.
    pub fn from_counts(target_launches: u32, successful: u32) -> Self {
        let now = Utc::now();
        let attempts = (1..=target_launches)
            .map(|iteration| LaunchAttempt {
                iteration,
                success: iteration <= successful,
                elapsed_ms: 0.0,
                error: None,
            })
            .collect();
        Self {
            target_launches,
            attempts,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn successful(&self) -> u32 {
        self.attempts.iter().filter(|a| a.success).count() as u32
    }

    pub fn failed(&self) -> u32 {
        self.attempts.iter().filter(|a| !a.success).count() as u32
    }

    /// Percentage of the target that succeeded.
    pub fn success_rate(&self) -> f64 {
        if self.target_launches == 0 {
            return 0.0;
        }
        f64::from(self.successful()) / f64::from(self.target_launches) * 100.0
    }

    pub fn stats(&self) -> LaunchStats {
        LaunchStats::from_attempts(&self.attempts)
    }

    pub fn duration_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

/// Number of marker lookups that fit in the load timeout.
fn marker_checks(config: &LaunchConfig) -> u32 {
    let interval = config.marker_poll_interval().as_secs_f64();
    if interval <= 0.0 {
        return 1;
    }
    let checks = (config.load_timeout().as_secs_f64() / interval).round();
    if checks < 1.0 {
        1
    } else {
        checks as u32
    }
}

/// Terminate, relaunch and time one launch.
pub async fn cold_launch<D>(driver: &D, app_id: &str, config: &LaunchConfig, iteration: u32) -> LaunchAttempt
where
    D: AutomationDriver + ?Sized,
{
    debug!(iteration, "cold launch");
    match timed_launch(driver, app_id, config).await {
        Ok((true, elapsed_ms)) => {
            info!(iteration, elapsed_ms, "cold launch completed");
            LaunchAttempt {
                iteration,
                success: true,
                elapsed_ms,
                error: None,
            }
        }
        Ok((false, elapsed_ms)) => {
            warn!(
                iteration,
                timeout_secs = config.load_timeout_secs,
                "app did not finish loading in time"
            );
            LaunchAttempt {
                iteration,
                success: false,
                elapsed_ms,
                error: None,
            }
        }
        Err(e) => {
            warn!(iteration, error = %e, "cold launch failed");
            LaunchAttempt {
                iteration,
                success: false,
                elapsed_ms: 0.0,
                error: Some(e.to_string()),
            }
        }
    }
}

async fn timed_launch<D>(driver: &D, app_id: &str, config: &LaunchConfig) -> GridResult<(bool, f64)>
where
    D: AutomationDriver + ?Sized,
{
    driver.terminate_app(app_id).await?;
    sleep(config.settle_delay()).await;

    let started = Instant::now();
    driver.activate_app(app_id).await?;

    let checks = marker_checks(config);
    let mut loaded = false;
    for check in 1..=checks {
        match driver.element_present(&config.loaded_marker).await {
            Ok(true) => {
                loaded = true;
                break;
            }
            Ok(false) => {}
            // Lookups fail transiently while the app is starting.
            Err(e) => debug!(check, error = %e, "marker lookup failed"),
        }
        if check < checks {
            sleep(config.marker_poll_interval()).await;
        }
    }

    Ok((loaded, started.elapsed().as_secs_f64() * 1000.0))
}

/// Run `config.target_launches` cold launches in order.
pub async fn run_cold_launches<D>(driver: &D, app_id: &str, config: &LaunchConfig) -> LaunchResults
where
    D: AutomationDriver + ?Sized,
{
    let target = config.target_launches;
    info!(target, app_id, "starting cold launch iterations");
    let started_at = Utc::now();

    let mut attempts = Vec::with_capacity(target as usize);
    for iteration in 1..=target {
        attempts.push(cold_launch(driver, app_id, config, iteration).await);
        if iteration % 5 == 0 {
            info!(completed = iteration, target, "launch progress");
        }
    }

    let results = LaunchResults {
        target_launches: target,
        attempts,
        started_at,
        finished_at: Utc::now(),
    };
    info!(
        successful = results.successful(),
        failed = results.failed(),
        "cold launches finished"
    );
    results
}
