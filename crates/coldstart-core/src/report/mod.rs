//! The persisted run report.

pub mod ci;
pub mod console;

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{AppConfig, Thresholds};
use crate::error::GridResult;
use crate::launch::{LaunchAttempt, LaunchResults, LaunchStats};
use crate::session::SessionAnalysis;
use crate::summary::{DetailedAnalysis, PerformanceSummary};
use crate::types::{ProfilingPayload, SessionSnapshot};
use crate::verdict::{PerformanceAssessment, Verdict};

/// Same-second reports for one session get `_1` .. `_N` suffixes.
const MAX_NAME_SUFFIX: u32 = 999;

pub const REPORT_TYPE: &str = "Integrated Performance Test Report";
pub const REPORT_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportInfo {
    pub report_date: DateTime<Utc>,
    pub report_type: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestStatistics {
    /// Successful launches as a percentage of the target.
    pub success_rate: f64,
    pub cold_launch_stats: LaunchStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestInfo {
    pub test_date: DateTime<Utc>,
    pub session_id: String,
    pub target_launches: u32,
    pub successful_launches: u32,
    pub failed_launches: u32,
    pub test_duration_seconds: f64,
    pub test_statistics: TestStatistics,
    #[serde(default)]
    pub launch_attempts: Vec<LaunchAttempt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceData {
    pub cold_launch_performance: LaunchStats,
    /// Summary metrics; the raw series live in `raw_profiling_data`.
    pub metrics: PerformanceSummary,
    pub performance_assessment: PerformanceAssessment,
    #[serde(default)]
    pub detailed_analysis: Option<DetailedAnalysis>,
    pub test_results: Verdict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestConfiguration {
    pub app_package: String,
    pub app_url: Option<String>,
    /// ANR events tolerated.
    pub frame_drop_threshold: u64,
    pub min_fps_threshold: f64,
    pub launch_success_ratio: f64,
    pub target_cold_launches: u32,
}

/// Top-level JSON document written after a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub report_info: ReportInfo,
    pub test_info: TestInfo,
    pub performance_data: PerformanceData,
    pub session_analysis: SessionAnalysis,
    pub session_data: Option<SessionSnapshot>,
    pub test_configuration: TestConfiguration,
    pub raw_profiling_data: Option<ProfilingPayload>,
}

/// Everything derived from one snapshot and one launch loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub summary: PerformanceSummary,
    pub detailed: Option<DetailedAnalysis>,
    pub assessment: PerformanceAssessment,
    pub verdict: Verdict,
    pub session_analysis: SessionAnalysis,
}

impl Evaluation {
    /// Reduce the snapshot and classify the run. A missing snapshot
    /// evaluates with default metrics.
    pub fn new(
        snapshot: Option<&SessionSnapshot>,
        launches: &LaunchResults,
        thresholds: &Thresholds,
    ) -> Self {
        let profiling = snapshot.and_then(SessionSnapshot::profiling);
        let summary = crate::summary::summarize(profiling.as_ref());
        let detailed = profiling.as_ref().map(DetailedAnalysis::from_payload);
        let assessment = PerformanceAssessment::assess(&summary, thresholds);
        let verdict = Verdict::evaluate(
            thresholds,
            launches.target_launches,
            launches.successful(),
            summary.anr_count,
            summary.avg_frame_rate,
        );
        let session_analysis =
            SessionAnalysis::from_details(snapshot.and_then(|s| s.session_details.as_ref()));

        Self {
            summary,
            detailed,
            assessment,
            verdict,
            session_analysis,
        }
    }
}

impl PerformanceReport {
    pub fn new(
        session_id: &str,
        launches: &LaunchResults,
        evaluation: Evaluation,
        snapshot: Option<SessionSnapshot>,
        app: &AppConfig,
        thresholds: &Thresholds,
    ) -> Self {
        let now = Utc::now();
        let stats = launches.stats();

        let mut metrics = evaluation.summary;
        let raw_profiling_data = metrics.raw_data.take();

        Self {
            report_info: ReportInfo {
                report_date: now,
                report_type: REPORT_TYPE.to_string(),
                version: REPORT_VERSION.to_string(),
            },
            test_info: TestInfo {
                test_date: launches.started_at,
                session_id: session_id.to_string(),
                target_launches: launches.target_launches,
                successful_launches: launches.successful(),
                failed_launches: launches.failed(),
                test_duration_seconds: launches.duration_secs(),
                test_statistics: TestStatistics {
                    success_rate: launches.success_rate(),
                    cold_launch_stats: stats.clone(),
                },
                launch_attempts: launches.attempts.clone(),
            },
            performance_data: PerformanceData {
                cold_launch_performance: stats,
                metrics,
                performance_assessment: evaluation.assessment,
                detailed_analysis: evaluation.detailed,
                test_results: evaluation.verdict,
            },
            session_analysis: evaluation.session_analysis,
            session_data: snapshot,
            test_configuration: TestConfiguration {
                app_package: app.package.clone(),
                app_url: app.app_url.clone(),
                frame_drop_threshold: thresholds.anr_threshold,
                min_fps_threshold: thresholds.min_fps,
                launch_success_ratio: thresholds.launch_success_ratio,
                target_cold_launches: launches.target_launches,
            },
            raw_profiling_data,
        }
    }

    pub fn verdict(&self) -> &Verdict {
        &self.performance_data.test_results
    }

    pub fn passed(&self) -> bool {
        self.verdict().overall_result
    }

    pub fn session_url(&self) -> Option<&str> {
        self.session_data.as_ref().map(|s| s.session_url.as_str())
    }
}

/// `integrated_performance_report_{session}_{YYYYMMDD_HHMMSS}.json`, local time.
pub fn report_file_name(session_id: &str, at: DateTime<Local>) -> String {
    let safe: String = session_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "integrated_performance_report_{}_{}.json",
        safe,
        at.format("%Y%m%d_%H%M%S")
    )
}

/// Write the report as pretty JSON into `dir`, returning the file path.
pub fn write_report(report: &PerformanceReport, dir: &Path) -> GridResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let json = serde_json::to_string_pretty(report)?;
    let name = report_file_name(&report.test_info.session_id, Local::now());
    let (path, mut file) = create_unique(dir, &name)?;
    file.write_all(json.as_bytes())?;
    info!(path = %path.display(), "report written");
    Ok(path)
}

/// Create `dir/name`, or `dir/{stem}_{n}.json` when that name is taken.
fn create_unique(dir: &Path, name: &str) -> std::io::Result<(PathBuf, File)> {
    let stem = name.strip_suffix(".json").unwrap_or(name);
    let mut n = 0u32;
    loop {
        let path = if n == 0 {
            dir.join(name)
        } else {
            dir.join(format!("{stem}_{n}.json"))
        };
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists && n < MAX_NAME_SUFFIX => n += 1,
            Err(e) => return Err(e),
        }
    }
}

/// Load a report written by `write_report`.
pub fn read_report(path: &Path) -> GridResult<PerformanceReport> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_report_file_name_format() {
        let at = Local.with_ymd_and_hms(2026, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            report_file_name("abc-123", at),
            "integrated_performance_report_abc-123_20260309_140507.json"
        );
        assert_eq!(
            report_file_name("a/b c", at),
            "integrated_performance_report_a_b_c_20260309_140507.json"
        );
    }

    #[test]
    fn test_report_moves_raw_series_out_of_metrics() {
        let report = report(9);
        assert!(report.performance_data.metrics.raw_data.is_none());
        let raw = report.raw_profiling_data.as_ref().unwrap();
        assert_eq!(raw.cpu.len(), 2);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["performance_data"]["metrics"].get("raw_data").is_none());
        assert_eq!(json["report_info"]["version"], "2.0");
        assert_eq!(json["test_info"]["successful_launches"], 9);
        assert_eq!(json["test_configuration"]["frame_drop_threshold"], 0);
    }

    #[test]
    fn test_report_verdict_uses_fps_and_launches() {
        // fps mean 60 meets the minimum.
        let report = report(9);
        assert!(report.passed());
        assert_eq!(report.performance_data.metrics.avg_frame_rate, 60.0);
        assert_eq!(report.performance_data.metrics.battery_drain_rate, -1.0);
        assert_eq!(report.session_analysis.device_name, "Pixel 4a");

        assert!(!super::fixtures::report(7).passed());
    }

    #[test]
    fn test_evaluation_without_snapshot_uses_defaults() {
        let launches = LaunchResults::from_counts(10, 10);
        let evaluation = Evaluation::new(None, &launches, &Thresholds::default());
        assert_eq!(evaluation.summary, PerformanceSummary::default());
        assert!(evaluation.detailed.is_none());
        assert!(evaluation.verdict.overall_result);
        assert_eq!(evaluation.session_analysis, SessionAnalysis::default());
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let report = report(10);
        let path = write_report(&report, &dir.path().join("reports")).unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("integrated_performance_report_S-42_"));
        assert!(name.ends_with(".json"));

        let loaded = read_report(&path).unwrap();
        assert_eq!(loaded.test_info.session_id, "S-42");
        assert_eq!(loaded.verdict(), report.verdict());
    }

    #[test]
    fn test_same_name_gets_suffix_instead_of_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let name = "integrated_performance_report_S-42_20240102_030405.json";
        std::fs::write(dir.path().join(name), "{}").unwrap();

        let (path, _file) = create_unique(dir.path(), name).unwrap();
        assert_eq!(
            path.file_name().unwrap(),
            "integrated_performance_report_S-42_20240102_030405_1.json"
        );
        assert_eq!(std::fs::read_to_string(dir.path().join(name)).unwrap(), "{}");
    }

    #[test]
    fn test_back_to_back_writes_keep_both_reports() {
        let dir = tempfile::tempdir().unwrap();
        let report = report(10);
        let first = write_report(&report, dir.path()).unwrap();
        let second = write_report(&report, dir.path()).unwrap();
        assert_ne!(first, second);
        assert!(read_report(&first).is_ok());
        assert!(read_report(&second).is_ok());
    }
}
