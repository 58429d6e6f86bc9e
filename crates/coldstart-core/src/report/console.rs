//! Human-readable run summary for the terminal.

use std::path::Path;

use crate::report::PerformanceReport;
use crate::summary::DetailedAnalysis;

fn mark(ok: bool) -> &'static str {
    if ok {
        "✅ PASSED"
    } else {
        "❌ FAILED"
    }
}

/// Human-readable summary lines. Deterministic, unit-testable.
#[must_use]
pub fn format_summary(report: &PerformanceReport, report_path: Option<&Path>) -> Vec<String> {
    let info = &report.test_info;
    let data = &report.performance_data;
    let m = &data.metrics;
    let v = &data.test_results;
    let stats = &data.cold_launch_performance;

    let mut lines = vec![
        String::new(),
        "📊 PERFORMANCE SUMMARY".to_string(),
        format!("   {}", "─".repeat(50)),
        format!("   Session: {}", info.session_id),
    ];
    if let Some(url) = report.session_url() {
        lines.push(format!("   🔗 Session page: {}", url));
    }
    if let Some(path) = report_path {
        lines.push(format!("   📁 Report: {}", path.display()));
    }
    lines.extend([
        format!("   📊 Overall Result: {}", mark(v.overall_result)),
        format!("   🚀 Launch Success: {}", mark(v.launch_success)),
        format!("   ⚠️  ANR Events: {}", mark(v.anr_events)),
        format!("   🎮 FPS Target: {}", mark(v.fps_target)),
        format!(
            "   📈 Success Rate: {:.2}% ({}/{})",
            info.test_statistics.success_rate, info.successful_launches, info.target_launches
        ),
        format!("   ⏱️  Avg Launch Time: {:.2}ms", stats.average),
        format!(
            "   ⏱️  Min / Max Launch Time: {:.2}ms / {:.2}ms (σ {:.2}ms)",
            stats.minimum, stats.maximum, stats.standard_deviation
        ),
        format!("   🎮 Avg Frame Rate: {:.1} FPS", m.avg_frame_rate),
        format!("   💻 Max CPU: {:.1}%", m.max_cpu_utilization),
        format!("   🧠 Max Memory: {:.1}MB", m.max_memory_usage),
        format!("   🔋 Battery Drain: {:.1}%", m.battery_drain_rate),
        format!("   🌡️  Peak Temperature: {:.1}°C", m.temperature),
        format!(
            "   📡 Network: {:.1}MB down / {:.1}MB up",
            m.network_download, m.network_upload
        ),
        format!("   ⚠️  ANR Count: {}  💥 Crashes: {}", m.anr_count, m.app_crashes),
    ]);

    if let Some(detailed) = &data.detailed_analysis {
        lines.extend(format_detailed(detailed));
    } else {
        lines.push("   ❌ No profiling data was available for this session".to_string());
    }
    lines
}

fn format_detailed(d: &DetailedAnalysis) -> Vec<String> {
    let mut lines = vec![String::new(), "🔍 DETAILED ANALYSIS".to_string()];
    let mut series = |label: &str, unit: &str, stats: Option<&crate::summary::SeriesStats>| {
        if let Some(s) = stats {
            lines.push(format!(
                "   {}: peak {:.1}{unit}, avg {:.1}{unit}, min {:.1}{unit} ({} samples)",
                label, s.max, s.avg, s.min, s.count
            ));
        }
    };
    series("CPU", "%", d.cpu.as_ref());
    series("Memory", "MB", d.memory.as_ref());
    series("Frame rate", " FPS", d.fps.as_ref());
    series("Temperature", "°C", d.temperature.as_ref());
    series("Disk", "MB", d.disk.as_ref());

    if let Some(f) = &d.frames {
        lines.push(format!(
            "   Frames: {:.0} janky ({:.1}%), {:.0} frozen ({:.1}%) over {} samples",
            f.janky_frames, f.janky_percentage, f.frozen_frames, f.frozen_percentage, f.total_samples
        ));
    }
    if let Some(b) = &d.battery {
        lines.push(format!(
            "   Battery: {:.1}% → {:.1}% ({:+.1}%, {} samples)",
            b.initial, b.r#final, b.drain, b.samples
        ));
    }
    if let Some(down) = &d.network_download {
        lines.push(format!(
            "   Download: {:.1}MB total, {:.1}MB avg",
            down.sum, down.avg
        ));
    }
    if let Some(up) = &d.network_upload {
        lines.push(format!("   Upload: {:.1}MB total, {:.1}MB avg", up.sum, up.avg));
    }
    lines
}

/// Print the summary to stderr.
pub fn print_summary(report: &PerformanceReport, report_path: Option<&Path>) {
    for line in format_summary(report, report_path) {
        eprintln!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures::report;

    #[test]
    fn test_summary_marks_each_check() {
        let lines = format_summary(&report(7), Some(Path::new("out/r.json")));
        let text = lines.join("\n");
        assert!(text.contains("📊 Overall Result: ❌ FAILED"));
        assert!(text.contains("🚀 Launch Success: ❌ FAILED"));
        assert!(text.contains("🎮 FPS Target: ✅ PASSED"));
        assert!(text.contains("Success Rate: 70.00% (7/10)"));
        assert!(text.contains("📁 Report: out/r.json"));
        assert!(text.contains("https://grid.test/build/S-42"));
        assert!(text.contains("DETAILED ANALYSIS"));
    }

    #[test]
    fn test_summary_without_profiling() {
        let mut r = report(10);
        r.performance_data.detailed_analysis = None;
        let text = format_summary(&r, None).join("\n");
        assert!(text.contains("No profiling data"));
        assert!(!text.contains("📁 Report"));
    }
}
