//! Error types for the grid client, driver and report writer.

use std::fmt;

/// Grid errors.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// Transport-level failure (connection refused, timeout, TLS).
    #[error("network error: {message}")]
    Network { message: String },

    /// Credentials rejected by the grid.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Response could not be interpreted.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Configuration error (missing credentials, empty session id, bad YAML).
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Automation driver command failed.
    #[error("driver error: {message}")]
    Driver { message: String },

    /// Local file I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Report or snapshot (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GridError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::Unauthorized { .. } => 2,

            // Infrastructure
            Self::Network { .. } => 3,
            Self::InvalidResponse { .. } => 3,
            Self::Driver { .. } => 3,

            Self::Io(_) | Self::Serialization(_) => 4,
        }
    }

    /// Whether the error is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::InvalidResponse { .. })
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for GridError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for grid operations.
pub type GridResult<T> = Result<T, GridError>;

/// Telemetry endpoints of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Profiling,
    Details,
    Video,
    Logs,
}

impl Endpoint {
    pub const ALL: [Endpoint; 4] = [
        Endpoint::Profiling,
        Endpoint::Details,
        Endpoint::Video,
        Endpoint::Logs,
    ];

    /// Path suffix appended to `{api}/sessions/{id}`.
    pub fn path_suffix(self) -> &'static str {
        match self {
            Endpoint::Profiling => "/log/appmetrics",
            Endpoint::Details => "",
            Endpoint::Video => "/video",
            Endpoint::Logs => "/log",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Endpoint::Profiling => "profiling metrics",
            Endpoint::Details => "session details",
            Endpoint::Video => "video",
            Endpoint::Logs => "logs",
        };
        f.write_str(name)
    }
}

/// A single endpoint had no usable data.
///
/// Never fatal: the snapshot records `None` for that endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{endpoint} unavailable: {reason}")]
pub struct Unavailable {
    pub endpoint: Endpoint,
    pub reason: String,
}

/// Outcome of reading one endpoint.
pub type Attempt<T> = Result<T, Unavailable>;
