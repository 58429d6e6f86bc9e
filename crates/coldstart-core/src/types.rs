//! Telemetry payload types for the session API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Serde helpers: vendor payloads mix numbers, numeric strings and nulls.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{ProfilingMeta, Sample};

    pub fn number<'de, D>(d: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Option::<Value>::deserialize(d)?;
        Ok(v.as_ref().and_then(super::as_number))
    }

    /// A `meta` that is not an object is treated as absent.
    pub fn meta<'de, D>(d: D) -> Result<Option<ProfilingMeta>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Option::<Value>::deserialize(d)?;
        Ok(match v {
            Some(v @ Value::Object(_)) => serde_json::from_value(v).ok(),
            _ => None,
        })
    }

    /// Non-array series become empty; non-object entries are dropped.
    pub fn series<'de, D>(d: D) -> Result<Vec<Sample>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = Option::<Value>::deserialize(d)?;
        Ok(match v {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(Sample(map)),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        })
    }
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// One timestamped telemetry sample with named fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sample(pub Map<String, Value>);

impl Sample {
    /// Numeric value of `field`; `None` when absent, null or not a number.
    pub fn value(&self, field: &str) -> Option<f64> {
        self.0.get(field).and_then(as_number)
    }

}

/// Vendor-computed aggregates shipped alongside the series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilingMeta {
    #[serde(
        rename = "coldStartup",
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub cold_startup: Option<f64>,

    #[serde(
        rename = "hotStartup",
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub hot_startup: Option<f64>,

    #[serde(
        rename = "maxCPUUtilization",
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_cpu_utilization: Option<f64>,

    #[serde(
        rename = "avgCpu",
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub avg_cpu: Option<f64>,

    #[serde(
        rename = "maxMemoryUsage",
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_memory_usage: Option<f64>,

    #[serde(
        rename = "avgMemory",
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub avg_memory: Option<f64>,

    #[serde(
        rename = "avgFrameRate",
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub avg_frame_rate: Option<f64>,

    #[serde(
        rename = "anrCount",
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub anr_count: Option<f64>,

    #[serde(
        rename = "crashCount",
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub crash_count: Option<f64>,

    #[serde(
        rename = "networkDownload",
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub network_download: Option<f64>,

    #[serde(
        rename = "networkUpload",
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub network_upload: Option<f64>,

    #[serde(
        rename = "avgDisk",
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub avg_disk: Option<f64>,

    #[serde(
        rename = "maxDiskUsage",
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_disk_usage: Option<f64>,

    /// Vendor fields not interpreted here, kept for the raw report.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProfilingMeta {
    /// True when the block carries any field at all.
    pub fn is_populated(&self) -> bool {
        !self.extra.is_empty()
            || [
                self.cold_startup,
                self.hot_startup,
                self.max_cpu_utilization,
                self.avg_cpu,
                self.max_memory_usage,
                self.avg_memory,
                self.avg_frame_rate,
                self.anr_count,
                self.crash_count,
                self.network_download,
                self.network_upload,
                self.avg_disk,
                self.max_disk_usage,
            ]
            .iter()
            .any(Option::is_some)
    }
}

/// Profiling payload of `/log/appmetrics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilingPayload {
    #[serde(
        default,
        deserialize_with = "lenient::meta",
        skip_serializing_if = "Option::is_none"
    )]
    pub meta: Option<ProfilingMeta>,

    #[serde(default, deserialize_with = "lenient::series")]
    pub cpu: Vec<Sample>,

    #[serde(default, deserialize_with = "lenient::series")]
    pub mem: Vec<Sample>,

    #[serde(default, deserialize_with = "lenient::series")]
    pub fps: Vec<Sample>,

    #[serde(default, deserialize_with = "lenient::series")]
    pub frames: Vec<Sample>,

    #[serde(default, deserialize_with = "lenient::series")]
    pub battery: Vec<Sample>,

    #[serde(default, deserialize_with = "lenient::series")]
    pub temperature: Vec<Sample>,

    #[serde(default, deserialize_with = "lenient::series")]
    pub network: Vec<Sample>,

    #[serde(default, deserialize_with = "lenient::series")]
    pub disk: Vec<Sample>,
}

impl ProfilingPayload {
    /// Interpret a raw endpoint body.
    ///
    /// Non-objects and empty objects mean "no profiling data".
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) if !map.is_empty() => serde_json::from_value(value.clone()).ok(),
            _ => None,
        }
    }

    /// Whether the vendor has produced usable profiling output yet.
    pub fn is_ready(&self) -> bool {
        self.meta.as_ref().is_some_and(ProfilingMeta::is_populated)
            || !self.cpu.is_empty()
            || !self.mem.is_empty()
    }
}

/// Everything fetched for one session in a single pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,

    /// Body of `/log/appmetrics`, `None` when unavailable.
    pub profiling_metrics: Option<Value>,

    pub session_details: Option<Value>,

    pub video_url: Option<Value>,

    pub logs: Option<Value>,

    /// Human-viewable session page.
    pub session_url: String,

    pub extraction_timestamp: DateTime<Utc>,
}

impl SessionSnapshot {
    /// Snapshot with every endpoint unavailable.
    pub fn empty(session_id: impl Into<String>, session_url: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            profiling_metrics: None,
            session_details: None,
            video_url: None,
            logs: None,
            session_url: session_url.into(),
            extraction_timestamp: Utc::now(),
        }
    }

    pub fn profiling(&self) -> Option<ProfilingPayload> {
        self.profiling_metrics
            .as_ref()
            .and_then(ProfilingPayload::from_value)
    }

    pub fn has_profiling_data(&self) -> bool {
        self.profiling().is_some_and(|p| p.is_ready())
    }
}
