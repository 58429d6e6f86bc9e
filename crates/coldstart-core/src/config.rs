//! Run configuration.
//!
//! Loaded from `coldstart.yaml` (every section optional) and overlaid with
//! environment variables:
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `COLDSTART_API_URL` | Telemetry API base URL |
//! | `COLDSTART_HUB_URL` | WebDriver hub URL |
//! | `COLDSTART_DASHBOARD_URL` | Base of human-viewable session links |
//! | `COLDSTART_USERNAME` | Grid username |
//! | `COLDSTART_ACCESS_KEY` | Grid access key |
//! | `COLDSTART_TIMEOUT` | HTTP request timeout in seconds (default: 30) |

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::driver::Selector;
use crate::error::{GridError, GridResult};

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "coldstart.yaml";

/// Complete configuration of a performance run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub grid: GridConfig,
    pub app: AppConfig,
    pub device: DeviceConfig,
    pub launch: LaunchConfig,
    pub polling: PollPolicy,
    pub thresholds: Thresholds,
}

impl RunConfig {
    /// Load from a YAML file, then apply environment overrides.
    pub fn load(path: &Path) -> GridResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            GridError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_yaml(&text)?;
        config.grid.apply_env();
        Ok(config)
    }

    /// Load `path` when it exists, otherwise start from defaults.
    pub fn load_or_default(path: &Path) -> GridResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let mut config = Self::default();
            config.grid.apply_env();
            Ok(config)
        }
    }

    pub fn from_yaml(text: &str) -> GridResult<Self> {
        serde_yaml::from_str(text).map_err(|e| GridError::config(format!("invalid config: {}", e)))
    }

    /// Check the fields a full run needs.
    pub fn validate(&self) -> GridResult<()> {
        self.grid.validate()?;
        if self.app.package.trim().is_empty() {
            return Err(GridError::config("app.package is required"));
        }
        if self.launch.target_launches == 0 {
            return Err(GridError::config("launch.target_launches must be at least 1"));
        }
        if self.polling.max_attempts == 0 {
            return Err(GridError::config("polling.max_attempts must be at least 1"));
        }
        Ok(())
    }
}

/// Remote grid endpoints and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Telemetry API base URL (sessions live under `{api_url}/sessions`).
    pub api_url: String,

    /// WebDriver hub URL.
    pub hub_url: String,

    /// Base URL of human-viewable session pages.
    pub dashboard_url: String,

    pub username: Option<String>,

    /// Never serialized into reports.
    #[serde(skip_serializing)]
    pub access_key: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://mobile-api.lambdatest.com/mobile-automation/api/v1".to_string()
}

fn default_hub_url() -> String {
    "https://mobile-hub.lambdatest.com/wd/hub".to_string()
}

fn default_dashboard_url() -> String {
    "https://mobile.lambdatest.com/build".to_string()
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            hub_url: default_hub_url(),
            dashboard_url: default_dashboard_url(),
            username: None,
            access_key: None,
            timeout_secs: 30,
        }
    }
}

impl GridConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overlay environment variables onto this config.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("COLDSTART_API_URL") {
            self.api_url = url;
        }
        if let Ok(url) = std::env::var("COLDSTART_HUB_URL") {
            self.hub_url = url;
        }
        if let Ok(url) = std::env::var("COLDSTART_DASHBOARD_URL") {
            self.dashboard_url = url;
        }
        if let Ok(user) = std::env::var("COLDSTART_USERNAME") {
            if !user.is_empty() {
                self.username = Some(user);
            }
        }
        if let Ok(key) = std::env::var("COLDSTART_ACCESS_KEY") {
            if !key.is_empty() {
                self.access_key = Some(key);
            }
        }
        if let Some(timeout) = std::env::var("COLDSTART_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.timeout_secs = timeout;
        }
    }

    pub fn validate(&self) -> GridResult<()> {
        if self.username.as_deref().unwrap_or("").is_empty() {
            return Err(GridError::config(
                "grid username missing (set COLDSTART_USERNAME)",
            ));
        }
        if self.access_key.as_deref().unwrap_or("").is_empty() {
            return Err(GridError::config(
                "grid access key missing (set COLDSTART_ACCESS_KEY)",
            ));
        }
        Ok(())
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_hub_url(mut self, url: impl Into<String>) -> Self {
        self.hub_url = url.into();
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        access_key: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.access_key = Some(access_key.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// App under test.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Android package / iOS bundle id used for activate/terminate.
    pub package: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,

    /// Uploaded app reference on the grid (e.g. `lt://APP...`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_url: Option<String>,
}

/// Device capabilities sent when the driver session is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub platform_name: String,
    pub device_name: String,
    pub platform_version: String,
    pub build: String,
    pub name: String,

    /// Extra capabilities merged last (vendor options, profiling switches).
    pub capabilities: BTreeMap<String, serde_json::Value>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        let mut capabilities = BTreeMap::new();
        for key in [
            "isRealMobile",
            "appProfiling",
            "resignApp",
            "network",
            "video",
            "console",
            "logcat",
            "autoGrantPermissions",
        ] {
            capabilities.insert(key.to_string(), serde_json::Value::Bool(true));
        }
        capabilities.insert(
            "deviceOrientation".to_string(),
            serde_json::Value::String("PORTRAIT".to_string()),
        );

        Self {
            platform_name: "Android".to_string(),
            device_name: "Google Pixel 4a".to_string(),
            platform_version: "12".to_string(),
            build: "Cold Launch Performance".to_string(),
            name: "Cold Launch Performance Test".to_string(),
            capabilities,
        }
    }
}

/// Cold-launch loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    pub target_launches: u32,

    /// Element whose presence means the app finished loading.
    pub loaded_marker: Selector,

    pub load_timeout_secs: f64,
    pub marker_poll_interval_secs: f64,

    /// Pause after terminating the app before relaunching it.
    pub settle_delay_secs: f64,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            target_launches: 10,
            loaded_marker: Selector::XPath(
                "//*[contains(@content-desc, 'Get Started') or contains(@content-desc, 'Log In')]"
                    .to_string(),
            ),
            load_timeout_secs: 10.0,
            marker_poll_interval_secs: 0.5,
            settle_delay_secs: 0.5,
        }
    }
}

impl LaunchConfig {
    pub fn load_timeout(&self) -> Duration {
        secs(self.load_timeout_secs)
    }

    pub fn marker_poll_interval(&self) -> Duration {
        secs(self.marker_poll_interval_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        secs(self.settle_delay_secs)
    }
}

/// Telemetry availability polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    /// Wait before the first fetch.
    pub initial_delay_secs: f64,

    /// Fetch attempts including the first one.
    pub max_attempts: u32,

    /// Delay after the first unsuccessful attempt.
    pub base_delay_secs: f64,

    /// Multiplier applied to the delay after every unsuccessful attempt.
    pub growth_factor: f64,

    /// Wait after stopping the session before polling starts.
    pub termination_settle_secs: f64,

    /// Wait for the grid to report the session finished before polling.
    pub await_completion: bool,
    pub completion_interval_secs: f64,
    pub completion_timeout_secs: f64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay_secs: 30.0,
            max_attempts: 5,
            base_delay_secs: 20.0,
            growth_factor: 1.2,
            termination_settle_secs: 10.0,
            await_completion: false,
            completion_interval_secs: 10.0,
            completion_timeout_secs: 300.0,
        }
    }
}

impl PollPolicy {
    /// A policy with no waiting at all; attempts are kept.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            initial_delay_secs: 0.0,
            max_attempts,
            base_delay_secs: 0.0,
            growth_factor: 1.0,
            termination_settle_secs: 0.0,
            await_completion: false,
            completion_interval_secs: 0.0,
            completion_timeout_secs: 0.0,
        }
    }

    pub fn initial_delay(&self) -> Duration {
        secs(self.initial_delay_secs)
    }

    pub fn termination_settle(&self) -> Duration {
        secs(self.termination_settle_secs)
    }

    pub fn completion_interval(&self) -> Duration {
        secs(self.completion_interval_secs)
    }

    pub fn completion_timeout(&self) -> Duration {
        secs(self.completion_timeout_secs)
    }

    /// Delay before attempt `failed_attempts + 1`, after `failed_attempts`
    /// unsuccessful fetches (1-based).
    pub fn backoff_delay(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1) as i32;
        let growth = if self.growth_factor > 0.0 {
            self.growth_factor
        } else {
            1.0
        };
        secs(self.base_delay_secs * growth.powi(exponent))
    }
}

/// Pass/fail thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Fraction of target launches that must succeed.
    pub launch_success_ratio: f64,

    /// ANR events tolerated.
    pub anr_threshold: u64,

    pub min_fps: f64,

    /// Lower bound of the "good" frame-rate band.
    pub good_fps: f64,

    /// Battery drain (percentage points) still considered acceptable.
    pub max_battery_drain: f64,

    /// Peak temperature (°C) still considered normal.
    pub max_temperature: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            launch_success_ratio: 0.8,
            anr_threshold: 0,
            min_fps: 60.0,
            good_fps: 50.0,
            max_battery_drain: 5.0,
            max_temperature: 35.0,
        }
    }
}

fn secs(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}
