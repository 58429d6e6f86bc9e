//! Pass/fail classification of a run.

use serde::{Deserialize, Serialize};

use crate::config::Thresholds;
use crate::summary::PerformanceSummary;

/// Per-dimension outcome plus the overall conjunction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Enough launches reached the loaded marker.
    pub launch_success: bool,
    /// ANR events within tolerance.
    pub anr_events: bool,
    /// Average frame rate at or above the minimum.
    pub fps_target: bool,
    pub overall_result: bool,
}

impl Verdict {
    /// Pure function of its inputs.
    pub fn evaluate(
        thresholds: &Thresholds,
        target_launches: u32,
        successful_launches: u32,
        anr_count: u64,
        avg_frame_rate: f64,
    ) -> Self {
        let required = f64::from(target_launches) * thresholds.launch_success_ratio;
        let launch_success = f64::from(successful_launches) >= required;
        let anr_events = anr_count <= thresholds.anr_threshold;
        let fps_target = avg_frame_rate >= thresholds.min_fps;

        Self {
            launch_success,
            anr_events,
            fps_target,
            overall_result: launch_success && anr_events && fps_target,
        }
    }

    pub fn passed_checks(&self) -> usize {
        [self.launch_success, self.anr_events, self.fps_target]
            .iter()
            .filter(|ok| **ok)
            .count()
    }

    pub const TOTAL_CHECKS: usize = 3;

    pub fn status_label(&self) -> &'static str {
        if self.overall_result {
            "PASSED"
        } else {
            "FAILED"
        }
    }
}

/// Frame-rate band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameRateQuality {
    Excellent,
    Good,
    Poor,
}

/// Informational health checks; they do not affect the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceAssessment {
    /// True when no ANR events were reported.
    pub anr_events: bool,
    pub frame_rate_quality: FrameRateQuality,
    /// True when no crashes were reported.
    pub app_crashes: bool,
    pub battery_drain_acceptable: bool,
    pub temperature_normal: bool,
}

impl PerformanceAssessment {
    pub fn assess(summary: &PerformanceSummary, thresholds: &Thresholds) -> Self {
        let frame_rate_quality = if summary.avg_frame_rate >= thresholds.min_fps {
            FrameRateQuality::Excellent
        } else if summary.avg_frame_rate >= thresholds.good_fps {
            FrameRateQuality::Good
        } else {
            FrameRateQuality::Poor
        };

        Self {
            anr_events: summary.anr_count == 0,
            frame_rate_quality,
            app_crashes: summary.app_crashes == 0,
            battery_drain_acceptable: summary.battery_drain_rate <= thresholds.max_battery_drain,
            temperature_normal: summary.temperature <= thresholds.max_temperature,
        }
    }
}
