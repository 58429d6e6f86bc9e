//! Session metadata as reported by the grid.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const UNKNOWN: &str = "Unknown";

/// Device and build information for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAnalysis {
    pub device_name: String,
    pub platform_version: String,
    pub app_package: String,
    pub test_name: String,
    pub build_name: String,
    pub status: String,
    pub start_time: String,
    pub end_time: String,
    /// Seconds.
    pub duration: f64,
    pub test_id: String,
    pub build_id: String,
    pub platform: String,
    pub user_id: String,
    pub username: String,
}

impl Default for SessionAnalysis {
    fn default() -> Self {
        Self {
            device_name: UNKNOWN.into(),
            platform_version: UNKNOWN.into(),
            app_package: UNKNOWN.into(),
            test_name: UNKNOWN.into(),
            build_name: UNKNOWN.into(),
            status: UNKNOWN.into(),
            start_time: UNKNOWN.into(),
            end_time: UNKNOWN.into(),
            duration: 0.0,
            test_id: UNKNOWN.into(),
            build_id: UNKNOWN.into(),
            platform: UNKNOWN.into(),
            user_id: UNKNOWN.into(),
            username: UNKNOWN.into(),
        }
    }
}

/// Render a scalar as text; ids arrive as numbers or strings depending on the endpoint.
fn text(obj: &Value, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

fn number(obj: &Value, key: &str) -> f64 {
    match obj.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

impl SessionAnalysis {
    /// Read the session-details body.
    ///
    /// The API wraps details in `data` with snake_case keys; older responses
    /// are flat with camelCase keys.
    pub fn from_details(details: Option<&Value>) -> Self {
        let Some(details) = details.filter(|d| d.is_object()) else {
            return Self::default();
        };

        match details.get("data").filter(|d| d.is_object()) {
            Some(data) => Self {
                device_name: text(data, "device_name"),
                platform_version: text(data, "os_version"),
                app_package: UNKNOWN.to_string(),
                test_name: text(data, "name"),
                build_name: text(data, "build_name"),
                status: text(data, "status_ind"),
                start_time: text(data, "start_timestamp"),
                end_time: text(data, "end_timestamp"),
                duration: number(data, "duration"),
                test_id: text(data, "test_id"),
                build_id: text(data, "build_id"),
                platform: text(data, "platform"),
                user_id: text(data, "user_id"),
                username: text(data, "username"),
            },
            None => Self {
                device_name: text(details, "deviceName"),
                platform_version: text(details, "platformVersion"),
                app_package: text(details, "appPackage"),
                test_name: text(details, "name"),
                build_name: text(details, "buildName"),
                status: text(details, "status"),
                start_time: text(details, "startTime"),
                end_time: text(details, "endTime"),
                duration: number(details, "duration"),
                test_id: text(details, "test_id"),
                build_id: text(details, "build_id"),
                platform: text(details, "platform"),
                user_id: text(details, "user_id"),
                username: text(details, "username"),
            },
        }
    }
}

/// Lifecycle state read from `data.status_ind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Completed,
    Failed,
    Running(String),
    Unknown,
}

impl SessionStatus {
    pub fn from_details(details: &Value) -> Self {
        match details
            .get("data")
            .and_then(|d| d.get("status_ind"))
            .and_then(Value::as_str)
        {
            Some("completed") => Self::Completed,
            Some("failed") => Self::Failed,
            Some(other) => Self::Running(other.to_string()),
            None => Self::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_details_unknown() {
        let a = SessionAnalysis::from_details(None);
        assert_eq!(a.device_name, "Unknown");
        assert_eq!(a.duration, 0.0);
        assert_eq!(SessionAnalysis::from_details(Some(&json!("oops"))), a);
    }

    #[test]
    fn test_nested_data_shape() {
        let details = json!({
            "data": {
                "device_name": "Galaxy S22",
                "os_version": "13",
                "name": "Cold Launch",
                "build_name": "nightly-412",
                "status_ind": "completed",
                "duration": 184,
                "test_id": "DA-XYZ",
                "build_id": 99812,
                "platform": "android",
                "username": "ci-bot"
            }
        });
        let a = SessionAnalysis::from_details(Some(&details));
        assert_eq!(a.device_name, "Galaxy S22");
        assert_eq!(a.platform_version, "13");
        assert_eq!(a.app_package, "Unknown");
        assert_eq!(a.status, "completed");
        assert_eq!(a.duration, 184.0);
        assert_eq!(a.build_id, "99812");
        assert_eq!(a.start_time, "Unknown");
        assert_eq!(a.username, "ci-bot");
    }

    #[test]
    fn test_flat_shape() {
        let details = json!({
            "deviceName": "Pixel 7",
            "platformVersion": "14",
            "appPackage": "com.example.shop",
            "status": "passed",
            "duration": "61.5"
        });
        let a = SessionAnalysis::from_details(Some(&details));
        assert_eq!(a.device_name, "Pixel 7");
        assert_eq!(a.app_package, "com.example.shop");
        assert_eq!(a.status, "passed");
        assert_eq!(a.duration, 61.5);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(
            SessionStatus::from_details(&json!({"data": {"status_ind": "completed"}})),
            SessionStatus::Completed
        );
        assert_eq!(
            SessionStatus::from_details(&json!({"data": {"status_ind": "failed"}})),
            SessionStatus::Failed
        );
        assert_eq!(
            SessionStatus::from_details(&json!({"data": {"status_ind": "running"}})),
            SessionStatus::Running("running".into())
        );
        assert_eq!(SessionStatus::from_details(&json!({})), SessionStatus::Unknown);
    }
}
