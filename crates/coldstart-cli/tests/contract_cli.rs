//! CLI contract: exit codes, key=value outputs and report files.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GRID_VARS: [&str; 6] = [
    "COLDSTART_API_URL",
    "COLDSTART_HUB_URL",
    "COLDSTART_DASHBOARD_URL",
    "COLDSTART_USERNAME",
    "COLDSTART_ACCESS_KEY",
    "COLDSTART_TIMEOUT",
];

fn coldstart(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("coldstart").unwrap();
    cmd.current_dir(dir);
    for var in GRID_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn write_snapshot(dir: &Path, avg_fps: u32, anr: u32) -> PathBuf {
    let snapshot = json!({
        "session_id": "S-cli",
        "profiling_metrics": {
            "meta": {"anrCount": anr},
            "fps": [{"count": avg_fps}, {"count": avg_fps}],
            "cpu": [{"app": 14.0}, {"app": 28.0}],
            "mem": [{"app": 210.0}]
        },
        "session_details": {"data": {"device_name": "Pixel 4a", "status_ind": "completed"}},
        "video_url": null,
        "logs": null,
        "session_url": "https://grid.test/build/S-cli",
        "extraction_timestamp": chrono::Utc::now().to_rfc3339()
    });
    let path = dir.join("snapshot.json");
    fs::write(&path, serde_json::to_string_pretty(&snapshot).unwrap()).unwrap();
    path
}

fn reports_in(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("integrated_performance_report_"))
        })
        .collect()
}

#[test]
fn test_version() {
    let dir = tempdir().unwrap();
    coldstart(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_analyze_passing_snapshot() {
    let dir = tempdir().unwrap();
    let snapshot = write_snapshot(dir.path(), 60, 0);
    let out = dir.path().join("reports");

    coldstart(dir.path())
        .args(["analyze", "--snapshot"])
        .arg(&snapshot)
        .args(["--target-launches", "10", "--successful-launches", "9"])
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("status=passed\n"))
        .stdout(predicate::str::contains("passed_tests=3\n"))
        .stdout(predicate::str::contains("success_rate=90.00\n"))
        .stdout(predicate::str::contains("report_path="))
        .stderr(predicate::str::contains("Overall Result: ✅ PASSED"));

    let reports = reports_in(&out);
    assert_eq!(reports.len(), 1);
    let report: Value = serde_json::from_str(&fs::read_to_string(&reports[0]).unwrap()).unwrap();
    assert_eq!(report["test_info"]["session_id"], "S-cli");
    assert_eq!(report["performance_data"]["test_results"]["overall_result"], true);
    assert_eq!(report["performance_data"]["metrics"]["max_cpu_utilization"], 28.0);
    assert_eq!(report["session_analysis"]["device_name"], "Pixel 4a");
    assert!(report["raw_profiling_data"]["cpu"].is_array());
}

#[test]
fn test_analyze_failing_verdict_exits_one() {
    let dir = tempdir().unwrap();
    let snapshot = write_snapshot(dir.path(), 45, 2);

    coldstart(dir.path())
        .args(["analyze", "--snapshot"])
        .arg(&snapshot)
        .args(["--target-launches", "10", "--successful-launches", "10"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("status=failed\n"))
        .stdout(predicate::str::contains("passed_tests=1\n"))
        .stdout(predicate::str::contains("failed_tests=2\n"));

    assert_eq!(reports_in(dir.path()).len(), 1);
}

#[test]
fn test_analyze_appends_ci_output_file() {
    let dir = tempdir().unwrap();
    let snapshot = write_snapshot(dir.path(), 60, 0);
    let ci_file = dir.path().join("github_output");
    fs::write(&ci_file, "previous=1\n").unwrap();

    coldstart(dir.path())
        .args(["analyze", "--snapshot"])
        .arg(&snapshot)
        .arg("--ci-output")
        .arg(&ci_file)
        .assert()
        .code(0);

    let text = fs::read_to_string(&ci_file).unwrap();
    assert!(text.starts_with("previous=1\nstatus=passed\n"));
    assert!(text.contains("target_launches=10\n"));
}

#[test]
fn test_analyze_missing_snapshot_is_io_error() {
    let dir = tempdir().unwrap();
    coldstart(dir.path())
        .args(["analyze", "--snapshot", "nope.json"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("reading snapshot"));
    assert!(reports_in(dir.path()).is_empty());
}

#[test]
fn test_analyze_rejects_more_successes_than_target() {
    let dir = tempdir().unwrap();
    let snapshot = write_snapshot(dir.path(), 60, 0);
    coldstart(dir.path())
        .args(["analyze", "--snapshot"])
        .arg(&snapshot)
        .args(["--target-launches", "3", "--successful-launches", "4"])
        .assert()
        .code(2);
}

#[test]
fn test_invalid_config_file_is_config_error() {
    let dir = tempdir().unwrap();
    let snapshot = write_snapshot(dir.path(), 60, 0);
    fs::write(dir.path().join("coldstart.yaml"), "launch: 42\n").unwrap();

    coldstart(dir.path())
        .args(["analyze", "--snapshot"])
        .arg(&snapshot)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("loading config"));
}

#[test]
fn test_collect_blank_session_id_is_config_error() {
    let dir = tempdir().unwrap();
    coldstart(dir.path())
        .args(["collect", "--session-id", "  ", "--once", "--no-stop"])
        .env("COLDSTART_API_URL", "http://127.0.0.1:9")
        .env("COLDSTART_USERNAME", "user")
        .env("COLDSTART_ACCESS_KEY", "key")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("status=").not())
        .stderr(predicate::str::contains("--session-id must not be empty"));
    assert!(reports_in(dir.path()).is_empty());
}

#[test]
fn test_run_without_credentials_is_config_error() {
    let dir = tempdir().unwrap();
    coldstart(dir.path())
        .args(["run", "--app-package", "com.example.shop"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("COLDSTART_USERNAME"));
    assert!(reports_in(dir.path()).is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stop_against_mock_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sessions/S9/stop"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let dir = tempdir().unwrap();
    let dir_path = dir.path().to_path_buf();
    let assert = tokio::task::spawn_blocking(move || {
        coldstart(&dir_path)
            .args(["stop", "--session-id", "S9"])
            .env("COLDSTART_API_URL", uri)
            .env("COLDSTART_USERNAME", "user")
            .env("COLDSTART_ACCESS_KEY", "key")
            .assert()
    })
    .await
    .unwrap();

    assert
        .code(0)
        .stderr(predicate::str::contains("Session S9 stopped"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_collect_once_without_stop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sessions/S7/log/appmetrics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fps": [{"count": 60}],
            "mem": [{"app": 190.0}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let uri = server.uri();
    let dir = tempdir().unwrap();
    let dir_path = dir.path().to_path_buf();
    let assert = tokio::task::spawn_blocking(move || {
        coldstart(&dir_path)
            .args([
                "collect",
                "--session-id",
                "S7",
                "--once",
                "--no-stop",
                "--target-launches",
                "5",
                "--successful-launches",
                "4",
            ])
            .env("COLDSTART_API_URL", uri)
            .env("COLDSTART_USERNAME", "user")
            .env("COLDSTART_ACCESS_KEY", "key")
            .assert()
    })
    .await
    .unwrap();

    assert
        .code(0)
        .stdout(predicate::str::contains("successful_launches=4\n"))
        .stdout(predicate::str::contains("failed_launches=1\n"));
    assert_eq!(reports_in(dir.path()).len(), 1);
}
