//! Device automation driver seam.
//!
//! The runner only needs app lifecycle commands and element lookup; the
//! WebDriver implementation lives in `webdriver.rs`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::GridResult;

pub mod webdriver;

pub use webdriver::WebDriverClient;

/// How to locate a UI element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    #[serde(rename = "xpath")]
    XPath(String),
    AccessibilityId(String),
    /// Exact visible text.
    Text(String),
}

impl Selector {
    /// W3C locator strategy and value.
    pub fn locator(&self) -> (&'static str, String) {
        match self {
            Selector::XPath(xpath) => ("xpath", xpath.clone()),
            Selector::AccessibilityId(id) => ("accessibility id", id.clone()),
            Selector::Text(text) => ("xpath", format!("//*[@text={}]", xpath_literal(text))),
        }
    }
}

/// Quote a string for use inside an XPath expression.
fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{}'", s)
    } else if !s.contains('"') {
        format!("\"{}\"", s)
    } else {
        let parts: Vec<String> = s.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// Remote device automation session.
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    fn session_id(&self) -> &str;

    async fn activate_app(&self, app_id: &str) -> GridResult<()>;

    async fn terminate_app(&self, app_id: &str) -> GridResult<()>;

    /// Single lookup; `Ok(false)` when nothing matches.
    async fn element_present(&self, selector: &Selector) -> GridResult<bool>;

    /// End the remote session.
    async fn quit(&self) -> GridResult<()>;
}

/// Owns a driver and guarantees it is quit at most once.
pub struct DriverSession<D: AutomationDriver> {
    driver: D,
    closed: bool,
}

impl<D: AutomationDriver> DriverSession<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            closed: false,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn session_id(&self) -> &str {
        self.driver.session_id()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Quit the driver. Returns false when it was already closed.
    ///
    /// A failing quit still marks the session closed.
    pub async fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        match self.driver.quit().await {
            Ok(()) => info!(session_id = self.driver.session_id(), "driver closed"),
            Err(e) => warn!(
                session_id = self.driver.session_id(),
                error = %e,
                "driver quit failed"
            ),
        }
        true
    }
}

impl<D: AutomationDriver> Drop for DriverSession<D> {
    fn drop(&mut self) {
        if !self.closed {
            warn!(
                session_id = self.driver.session_id(),
                "driver session dropped without quit; the grid will hold it until timeout"
            );
        }
    }
}
