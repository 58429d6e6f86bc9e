//! Reduction of profiling time series into a fixed performance summary.

use serde::{Deserialize, Serialize};

use crate::types::{ProfilingPayload, Sample};

/// Min / max / mean over one series field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub sum: f64,
    pub count: usize,
}

impl SeriesStats {
    /// `None` for an empty input.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let sum: f64 = values.iter().sum();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            min,
            max,
            avg: sum / values.len() as f64,
            sum,
            count: values.len(),
        })
    }
}

/// Values of `field` across `samples`, in order, skipping samples without it.
pub fn field_values(samples: &[Sample], field: &str) -> Vec<f64> {
    samples.iter().filter_map(|s| s.value(field)).collect()
}

fn fps_values(samples: &[Sample]) -> Vec<f64> {
    samples
        .iter()
        .filter_map(|s| s.value("count"))
        .filter(|c| *c > 0.0)
        .collect()
}

/// Last minus first; 0 with fewer than two values.
fn delta(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(first), Some(last)) if values.len() > 1 => last - first,
        _ => 0.0,
    }
}

/// Summary metrics for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Vendor-measured cold startup (ms).
    pub cold_startup_time: f64,
    pub hot_startup_time: f64,
    pub max_cpu_utilization: f64,
    pub avg_cpu: f64,
    pub max_memory_usage: f64,
    pub avg_memory_usage: f64,
    pub avg_frame_rate: f64,
    pub anr_count: u64,
    pub app_crashes: u64,
    /// Battery level change over the session (last − first).
    pub battery_drain_rate: f64,
    /// Peak temperature.
    pub temperature: f64,
    pub network_download: f64,
    pub network_upload: f64,
    pub avg_disk: f64,
    pub max_disk_usage: f64,
    /// Series the summary was computed from; `None` when no profiling data existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<ProfilingPayload>,
}

impl Default for PerformanceSummary {
    fn default() -> Self {
        Self {
            cold_startup_time: 0.0,
            hot_startup_time: 0.0,
            max_cpu_utilization: 0.0,
            avg_cpu: 0.0,
            max_memory_usage: 0.0,
            avg_memory_usage: 0.0,
            avg_frame_rate: 60.0,
            anr_count: 0,
            app_crashes: 0,
            battery_drain_rate: 0.0,
            temperature: 0.0,
            network_download: 0.0,
            network_upload: 0.0,
            avg_disk: 0.0,
            max_disk_usage: 0.0,
            raw_data: None,
        }
    }
}

fn count(v: Option<f64>) -> u64 {
    v.filter(|n| n.is_finite() && *n > 0.0)
        .map(|n| n.round() as u64)
        .unwrap_or(0)
}

/// Reduce a profiling payload.
///
/// Meta values seed the summary; any series yielding at least one value
/// overwrites the fields it covers.
pub fn summarize(profiling: Option<&ProfilingPayload>) -> PerformanceSummary {
    let Some(profiling) = profiling else {
        return PerformanceSummary::default();
    };

    let mut s = PerformanceSummary {
        raw_data: Some(profiling.clone()),
        ..PerformanceSummary::default()
    };

    if let Some(meta) = profiling.meta.as_ref().filter(|m| m.is_populated()) {
        s.cold_startup_time = meta.cold_startup.unwrap_or(0.0);
        s.hot_startup_time = meta.hot_startup.unwrap_or(0.0);
        s.max_cpu_utilization = meta.max_cpu_utilization.unwrap_or(0.0);
        s.avg_cpu = meta.avg_cpu.unwrap_or(0.0);
        s.max_memory_usage = meta.max_memory_usage.unwrap_or(0.0);
        s.avg_memory_usage = meta.avg_memory.unwrap_or(0.0);
        s.avg_frame_rate = meta.avg_frame_rate.unwrap_or(60.0);
        s.anr_count = count(meta.anr_count);
        s.app_crashes = count(meta.crash_count);
        s.network_download = meta.network_download.unwrap_or(0.0);
        s.network_upload = meta.network_upload.unwrap_or(0.0);
        s.avg_disk = meta.avg_disk.unwrap_or(0.0);
        s.max_disk_usage = meta.max_disk_usage.unwrap_or(0.0);
    }

    if let Some(cpu) = SeriesStats::from_values(&field_values(&profiling.cpu, "app")) {
        s.max_cpu_utilization = cpu.max;
        s.avg_cpu = cpu.avg;
    }

    if let Some(mem) = SeriesStats::from_values(&field_values(&profiling.mem, "app")) {
        s.max_memory_usage = mem.max;
        s.avg_memory_usage = mem.avg;
    }

    if let Some(fps) = SeriesStats::from_values(&fps_values(&profiling.fps)) {
        s.avg_frame_rate = fps.avg;
    }

    let battery = field_values(&profiling.battery, "sys");
    if battery.len() > 1 {
        s.battery_drain_rate = delta(&battery);
    }

    if let Some(temp) = SeriesStats::from_values(&field_values(&profiling.temperature, "temp")) {
        s.temperature = temp.max;
    }

    if let Some(down) = SeriesStats::from_values(&field_values(&profiling.network, "appIn")) {
        s.network_download = down.sum;
    }
    if let Some(up) = SeriesStats::from_values(&field_values(&profiling.network, "appOut")) {
        s.network_upload = up.sum;
    }

    if let Some(disk) = SeriesStats::from_values(&field_values(&profiling.disk, "app")) {
        s.avg_disk = disk.avg;
        s.max_disk_usage = disk.max;
    }

    s
}

/// Frame timing totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameDropStats {
    pub janky_frames: f64,
    pub frozen_frames: f64,
    pub total_samples: usize,
    pub janky_percentage: f64,
    pub frozen_percentage: f64,
}

/// Battery readings over the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryStats {
    pub initial: f64,
    pub r#final: f64,
    pub drain: f64,
    pub samples: usize,
}

/// Per-category breakdown printed after the summary and kept in the report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailedAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<SeriesStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<SeriesStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<SeriesStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frames: Option<FrameDropStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery: Option<BatteryStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<SeriesStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_download: Option<SeriesStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_upload: Option<SeriesStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk: Option<SeriesStats>,
    pub network_samples: usize,
}

impl DetailedAnalysis {
    pub fn from_payload(p: &ProfilingPayload) -> Self {
        let frames = (!p.frames.is_empty()).then(|| {
            let janky: f64 = p.frames.iter().filter_map(|f| f.value("janky")).sum();
            let frozen: f64 = p.frames.iter().filter_map(|f| f.value("frozen")).sum();
            let total = p.frames.len();
            FrameDropStats {
                janky_frames: janky,
                frozen_frames: frozen,
                total_samples: total,
                janky_percentage: janky / total as f64 * 100.0,
                frozen_percentage: frozen / total as f64 * 100.0,
            }
        });

        let battery_values = field_values(&p.battery, "sys");
        let battery = (battery_values.len() > 1).then(|| BatteryStats {
            initial: battery_values[0],
            r#final: battery_values[battery_values.len() - 1],
            drain: delta(&battery_values),
            samples: battery_values.len(),
        });

        Self {
            cpu: SeriesStats::from_values(&field_values(&p.cpu, "app")),
            memory: SeriesStats::from_values(&field_values(&p.mem, "app")),
            fps: SeriesStats::from_values(&fps_values(&p.fps)),
            frames,
            battery,
            temperature: SeriesStats::from_values(&field_values(&p.temperature, "temp")),
            network_download: SeriesStats::from_values(&field_values(&p.network, "appIn")),
            network_upload: SeriesStats::from_values(&field_values(&p.network, "appOut")),
            disk: SeriesStats::from_values(&field_values(&p.disk, "app")),
            network_samples: p.network.len(),
        }
    }
}
