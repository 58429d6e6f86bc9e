//! HTTP layer: authentication and status mapping.
//!
//! This is the ONLY place for status code handling. client/mod.rs never
//! interprets status codes.

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::GridConfig;
use crate::error::{Attempt, Endpoint, GridResult, Unavailable};

/// Maximum number of body characters quoted in an `Unavailable` reason.
const REASON_BODY_LIMIT: usize = 200;

/// HTTP backend for making requests (holds reqwest client and credentials).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) config: GridConfig,
}

impl HttpBackend {
    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.username {
            Some(user) => request.basic_auth(user, self.config.access_key.as_deref()),
            None => request,
        }
    }

    /// GET a JSON document. Transport failures are errors; anything other
    /// than a 200 with a JSON body is `Unavailable`.
    pub(crate) async fn get_json(&self, url: &str, endpoint: Endpoint) -> GridResult<Attempt<Value>> {
        debug!(url = %url, endpoint = %endpoint, "fetching");

        let response = self.authed(self.client.get(url)).send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                warn!(endpoint = %endpoint, status = status.as_u16(), "grid rejected credentials");
            }
            let body = response.text().await.unwrap_or_default();
            return Ok(Err(Unavailable {
                endpoint,
                reason: unavailable_reason(status, &body),
            }));
        }

        let body = response.text().await?;
        match serde_json::from_str(&body) {
            Ok(value) => Ok(Ok(value)),
            Err(e) => Ok(Err(Unavailable {
                endpoint,
                reason: format!("invalid JSON body: {}", e),
            })),
        }
    }

    /// POST without a body; returns the status code.
    pub(crate) async fn post_empty(&self, url: &str) -> GridResult<StatusCode> {
        debug!(url = %url, "posting");
        let response = self.authed(self.client.post(url)).send().await?;
        Ok(response.status())
    }
}

fn unavailable_reason(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        let snippet: String = body.chars().take(REASON_BODY_LIMIT).collect();
        format!("HTTP {}: {}", status.as_u16(), snippet)
    }
}
