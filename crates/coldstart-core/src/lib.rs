//! Cold-launch performance runs on a remote device grid.
//!
//! This crate provides:
//!
//! - A WebDriver client for creating a device session and driving app launches
//! - A client for the grid's session telemetry API
//! - Availability polling with growing backoff
//! - Reduction of profiling series into a fixed performance summary
//! - Pass/fail classification and a JSON report
//!
//! # Quick Start
//!
//! ```no_run
//! use coldstart_core::{PollPolicy, SessionApiClient, poll_for_profiling, summarize};
//!
//! # async fn example() -> coldstart_core::GridResult<()> {
//! let client = SessionApiClient::from_env()?;
//! let outcome = poll_for_profiling(&client, "SESSION-ID", &PollPolicy::default()).await;
//! let profiling = outcome.snapshot.as_ref().and_then(|s| s.profiling());
//! let summary = summarize(profiling.as_ref());
//! println!("avg fps: {:.1}", summary.avg_frame_rate);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `COLDSTART_API_URL` | Telemetry API base URL |
//! | `COLDSTART_HUB_URL` | WebDriver hub URL |
//! | `COLDSTART_DASHBOARD_URL` | Base of human-viewable session links |
//! | `COLDSTART_USERNAME` | Grid username |
//! | `COLDSTART_ACCESS_KEY` | Grid access key |
//! | `COLDSTART_TIMEOUT` | Request timeout in seconds (default: 30) |

pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod launch;
pub mod poll;
pub mod report;
pub mod runner;
pub mod session;
pub mod summary;
pub mod types;
pub mod verdict;

// Re-export main types
pub use client::{SessionApi, SessionApiClient};
pub use config::{
    AppConfig, DeviceConfig, GridConfig, LaunchConfig, PollPolicy, RunConfig, Thresholds,
    CONFIG_FILE_NAME,
};
pub use driver::{AutomationDriver, DriverSession, Selector, WebDriverClient};
pub use error::{Attempt, Endpoint, GridError, GridResult, Unavailable};
pub use launch::{run_cold_launches, LaunchAttempt, LaunchResults, LaunchStats};
pub use poll::{poll_for_profiling, wait_for_completion, PollOutcome};
pub use report::{read_report, write_report, Evaluation, PerformanceReport};
pub use runner::{report_run, PerformanceRun, RunOutcome};
pub use session::{SessionAnalysis, SessionStatus};
pub use summary::{summarize, DetailedAnalysis, PerformanceSummary, SeriesStats};
pub use types::{ProfilingPayload, Sample, SessionSnapshot};
pub use verdict::{FrameRateQuality, PerformanceAssessment, Verdict};
