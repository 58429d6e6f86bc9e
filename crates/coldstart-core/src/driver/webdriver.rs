//! W3C WebDriver client with the Appium app lifecycle extensions.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::{AutomationDriver, Selector};
use crate::client::GRID_USER_AGENT;
use crate::config::{AppConfig, DeviceConfig, GridConfig};
use crate::error::{GridError, GridResult};

/// Key under which vendor-specific capabilities are nested.
pub const VENDOR_OPTIONS_KEY: &str = "lt:options";

/// Device allocation on a shared grid can take minutes.
const SESSION_CREATE_TIMEOUT: Duration = Duration::from_secs(600);

/// A live WebDriver session on the hub.
#[derive(Debug)]
pub struct WebDriverClient {
    client: reqwest::Client,
    hub_url: String,
    username: Option<String>,
    access_key: Option<String>,
    session_id: String,
}

impl WebDriverClient {
    /// Create a session on the hub. Fails when the hub rejects the
    /// capabilities or returns no session id.
    pub async fn connect(
        grid: &GridConfig,
        device: &DeviceConfig,
        app: &AppConfig,
    ) -> GridResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(GRID_USER_AGENT));
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(grid.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| GridError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        let hub_url = grid.hub_url.trim_end_matches('/').to_string();
        let body = json!({
            "capabilities": {
                "alwaysMatch": capabilities(device, app),
                "firstMatch": [{}],
            }
        });

        info!(hub = %hub_url, device = %device.device_name, "creating driver session");
        let mut request = client
            .post(format!("{}/session", hub_url))
            .timeout(SESSION_CREATE_TIMEOUT)
            .json(&body);
        if let Some(user) = &grid.username {
            request = request.basic_auth(user, grid.access_key.as_deref());
        }
        let response = request.send().await?;
        let status = response.status();
        let payload: Value = response.json().await.unwrap_or(Value::Null);

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GridError::Unauthorized {
                message: format!("hub rejected credentials (HTTP {})", status.as_u16()),
            });
        }
        if !status.is_success() {
            return Err(GridError::driver(format!(
                "session creation failed (HTTP {}): {}",
                status.as_u16(),
                error_message(&payload)
            )));
        }

        let session_id = payload
            .pointer("/value/sessionId")
            .or_else(|| payload.get("sessionId"))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| GridError::InvalidResponse {
                message: "hub response carried no session id".to_string(),
            })?
            .to_string();

        info!(session_id = %session_id, "driver session created");
        Ok(Self {
            client,
            hub_url,
            username: grid.username.clone(),
            access_key: grid.access_key.clone(),
            session_id,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/session/{}{}", self.hub_url, self.session_id, path)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.username {
            Some(user) => request.basic_auth(user, self.access_key.as_deref()),
            None => request,
        }
    }

    /// POST a command; non-2xx responses become driver errors.
    async fn command(&self, path: &str, body: Value) -> GridResult<Value> {
        debug!(session_id = %self.session_id, path, "driver command");
        let response = self
            .authed(self.client.post(self.url(path)))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let payload: Value = response.json().await.unwrap_or(Value::Null);
        if status.is_success() {
            Ok(payload)
        } else {
            Err(GridError::driver(format!(
                "{} failed (HTTP {}): {}",
                path.trim_start_matches('/'),
                status.as_u16(),
                error_message(&payload)
            )))
        }
    }
}

#[async_trait]
impl AutomationDriver for WebDriverClient {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn activate_app(&self, app_id: &str) -> GridResult<()> {
        self.command("/appium/device/activate_app", json!({ "appId": app_id }))
            .await
            .map(|_| ())
    }

    async fn terminate_app(&self, app_id: &str) -> GridResult<()> {
        self.command("/appium/device/terminate_app", json!({ "appId": app_id }))
            .await
            .map(|_| ())
    }

    async fn element_present(&self, selector: &Selector) -> GridResult<bool> {
        let (using, value) = selector.locator();
        let response = self
            .authed(self.client.post(self.url("/element")))
            .json(&json!({ "using": using, "value": value }))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        let payload: Value = response.json().await.unwrap_or(Value::Null);
        if status == StatusCode::NOT_FOUND || error_code(&payload) == Some("no such element") {
            return Ok(false);
        }
        Err(GridError::driver(format!(
            "element lookup failed (HTTP {}): {}",
            status.as_u16(),
            error_message(&payload)
        )))
    }

    async fn quit(&self) -> GridResult<()> {
        let response = self
            .authed(self.client.delete(self.url("")))
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(GridError::driver(format!(
                "session delete failed (HTTP {})",
                status.as_u16()
            )))
        }
    }
}

/// Build the `alwaysMatch` capabilities for a device and app.
pub fn capabilities(device: &DeviceConfig, app: &AppConfig) -> Value {
    let mut caps = Map::new();
    caps.insert("platformName".into(), json!(device.platform_name));
    caps.insert("appium:deviceName".into(), json!(device.device_name));
    caps.insert("appium:platformVersion".into(), json!(device.platform_version));
    if let Some(app_url) = &app.app_url {
        caps.insert("appium:app".into(), json!(app_url));
    }
    if !app.package.is_empty() {
        caps.insert("appium:appPackage".into(), json!(app.package));
    }
    if let Some(activity) = &app.activity {
        caps.insert("appium:appActivity".into(), json!(activity));
    }

    let mut vendor = Map::new();
    vendor.insert("w3c".into(), Value::Bool(true));
    vendor.insert("build".into(), json!(device.build));
    vendor.insert("name".into(), json!(device.name));
    for (key, value) in &device.capabilities {
        if key.contains(':') || key == "platformName" {
            caps.insert(key.clone(), value.clone());
        } else {
            vendor.insert(key.clone(), value.clone());
        }
    }
    caps.insert(VENDOR_OPTIONS_KEY.into(), Value::Object(vendor));
    Value::Object(caps)
}

fn error_code(payload: &Value) -> Option<&str> {
    payload.pointer("/value/error").and_then(Value::as_str)
}

fn error_message(payload: &Value) -> String {
    payload
        .pointer("/value/message")
        .and_then(Value::as_str)
        .or_else(|| error_code(payload))
        .unwrap_or("no error detail")
        .chars()
        .take(200)
        .collect()
}
