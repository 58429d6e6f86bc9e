//! `key=value` lines for CI step outputs.

use std::io::Write;
use std::path::Path;

use crate::error::GridResult;
use crate::report::PerformanceReport;
use crate::verdict::Verdict;

/// Output lines in a fixed order.
pub fn ci_outputs(report: &PerformanceReport, report_path: &Path) -> Vec<(&'static str, String)> {
    let verdict = report.verdict();
    let passed = verdict.passed_checks();
    let info = &report.test_info;
    let status = if verdict.overall_result {
        "passed"
    } else {
        "failed"
    };

    vec![
        ("status", status.to_string()),
        ("passed_tests", passed.to_string()),
        ("failed_tests", (Verdict::TOTAL_CHECKS - passed).to_string()),
        ("total_tests", Verdict::TOTAL_CHECKS.to_string()),
        (
            "success_rate",
            format!("{:.2}", info.test_statistics.success_rate),
        ),
        ("successful_launches", info.successful_launches.to_string()),
        ("failed_launches", info.failed_launches.to_string()),
        ("target_launches", info.target_launches.to_string()),
        ("report_path", report_path.display().to_string()),
    ]
}

pub fn format_lines(outputs: &[(&'static str, String)]) -> String {
    outputs
        .iter()
        .map(|(k, v)| format!("{}={}\n", k, v))
        .collect()
}

/// Append the lines to `path` (e.g. `$GITHUB_OUTPUT`), creating it if needed.
pub fn append_to_file(outputs: &[(&'static str, String)], path: &Path) -> GridResult<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.write_all(format_lines(outputs).as_bytes())?;
    Ok(())
}
