//! Client for the grid's session telemetry API.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::GridConfig;
use crate::error::{Attempt, Endpoint, GridError, GridResult};
use crate::types::SessionSnapshot;

mod http;

use http::HttpBackend;

/// User agent for grid requests.
pub const GRID_USER_AGENT: &str = concat!("coldstart/", env!("CARGO_PKG_VERSION"));

/// Session telemetry operations the aggregator depends on.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Read all four endpoints once. No retries.
    async fn fetch_snapshot(&self, session_id: &str) -> GridResult<SessionSnapshot>;

    /// Ask the grid to end the session. `Ok(false)` when the grid refused.
    async fn stop_session(&self, session_id: &str) -> GridResult<bool>;

    async fn session_details(&self, session_id: &str) -> GridResult<Attempt<Value>>;
}

/// HTTP client for the telemetry API.
#[derive(Debug, Clone)]
pub struct SessionApiClient {
    http: HttpBackend,
    api_url: String,
    dashboard_url: String,
}

impl SessionApiClient {
    pub fn new(config: GridConfig) -> GridResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(GRID_USER_AGENT));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| GridError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        let api_url = config.api_url.trim_end_matches('/').to_string();
        let dashboard_url = config.dashboard_url.trim_end_matches('/').to_string();

        Ok(Self {
            http: HttpBackend { client, config },
            api_url,
            dashboard_url,
        })
    }

    pub fn from_env() -> GridResult<Self> {
        Self::new(GridConfig::from_env())
    }

    /// Read one endpoint.
    pub async fn fetch_endpoint(
        &self,
        session_id: &str,
        endpoint: Endpoint,
    ) -> GridResult<Attempt<Value>> {
        let url = self.endpoint_url(session_id, endpoint)?;
        let attempt = self.http.get_json(&url, endpoint).await?;
        if let Err(unavailable) = &attempt {
            debug!(session_id, reason = %unavailable, "endpoint unavailable");
        }
        Ok(attempt)
    }

    /// Human-viewable page for a session.
    pub fn session_url(&self, session_id: &str) -> String {
        format!("{}/{}", self.dashboard_url, session_id)
    }

    fn session_base(&self, session_id: &str) -> GridResult<String> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(GridError::config("session id must not be empty"));
        }
        Ok(format!("{}/sessions/{}", self.api_url, session_id))
    }

    fn endpoint_url(&self, session_id: &str, endpoint: Endpoint) -> GridResult<String> {
        Ok(format!(
            "{}{}",
            self.session_base(session_id)?,
            endpoint.path_suffix()
        ))
    }
}

#[async_trait]
impl SessionApi for SessionApiClient {
    async fn fetch_snapshot(&self, session_id: &str) -> GridResult<SessionSnapshot> {
        info!(session_id, "extracting session data");

        let profiling = self.fetch_endpoint(session_id, Endpoint::Profiling).await?;
        let details = self.fetch_endpoint(session_id, Endpoint::Details).await?;
        let video = self.fetch_endpoint(session_id, Endpoint::Video).await?;
        let logs = self.fetch_endpoint(session_id, Endpoint::Logs).await?;

        Ok(SessionSnapshot {
            session_id: session_id.to_string(),
            profiling_metrics: profiling.ok(),
            session_details: details.ok(),
            video_url: video.ok(),
            logs: logs.ok(),
            session_url: self.session_url(session_id),
            extraction_timestamp: Utc::now(),
        })
    }

    async fn stop_session(&self, session_id: &str) -> GridResult<bool> {
        let url = format!("{}/stop", self.session_base(session_id)?);
        let status = self.http.post_empty(&url).await?;
        if status.as_u16() == 200 {
            info!(session_id, "session stopped");
            Ok(true)
        } else {
            warn!(session_id, status = status.as_u16(), "grid refused to stop session");
            Ok(false)
        }
    }

    async fn session_details(&self, session_id: &str) -> GridResult<Attempt<Value>> {
        self.fetch_endpoint(session_id, Endpoint::Details).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SessionApiClient {
        let config = GridConfig::default()
            .with_api_url("https://api.grid.test/v1/")
            .with_credentials("user", "key");
        SessionApiClient::new(config).expect("client")
    }

    #[test]
    fn test_endpoint_urls() {
        let c = client();
        assert_eq!(
            c.endpoint_url("S1", Endpoint::Profiling).unwrap(),
            "https://api.grid.test/v1/sessions/S1/log/appmetrics"
        );
        assert_eq!(
            c.endpoint_url("S1", Endpoint::Details).unwrap(),
            "https://api.grid.test/v1/sessions/S1"
        );
        assert_eq!(
            c.endpoint_url("S1", Endpoint::Video).unwrap(),
            "https://api.grid.test/v1/sessions/S1/video"
        );
        assert_eq!(
            c.endpoint_url("S1", Endpoint::Logs).unwrap(),
            "https://api.grid.test/v1/sessions/S1/log"
        );
    }

    #[test]
    fn test_empty_session_id_rejected() {
        let err = client().endpoint_url("  ", Endpoint::Video).unwrap_err();
        assert!(matches!(err, GridError::Config { .. }));
    }

    #[test]
    fn test_session_url_uses_dashboard() {
        let c = client();
        assert_eq!(
            c.session_url("S1"),
            "https://mobile.lambdatest.com/build/S1"
        );
    }
}
