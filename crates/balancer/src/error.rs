//! Error types for the balancer.
//!
//! Every user-visible error names the stage that failed: validating the
//! request, looking up the owner, or forwarding to it.

use std::path::PathBuf;
use std::time::Duration;

use corelib::Node;

use crate::request::Operation;

/// Why a routed request did not produce a backend response.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// Missing or invalid key/body; rejected before any lookup.
    #[error("malformed request: {0}")]
    Malformed(String),

    /// The ring is empty; no network call was attempted.
    #[error("no nodes available")]
    NoNodes,

    /// Owner lookup failed for another reason.
    #[error("lookup failed: {0}")]
    Lookup(corelib::Error),

    /// The owning node could not be reached. Not retried elsewhere.
    #[error("error forwarding {op} to node {node}: {source}")]
    Forward {
        op: Operation,
        node: Node,
        #[source]
        source: ForwardError,
    },
}

impl RouteError {
    /// The stage that failed: `request`, `lookup` or `forward`.
    pub fn stage(&self) -> &'static str {
        match self {
            RouteError::Malformed(_) => "request",
            RouteError::NoNodes | RouteError::Lookup(_) => "lookup",
            RouteError::Forward { .. } => "forward",
        }
    }
}

impl From<corelib::Error> for RouteError {
    fn from(err: corelib::Error) -> Self {
        match err {
            corelib::Error::EmptyRing => RouteError::NoNodes,
            other => RouteError::Lookup(other),
        }
    }
}

/// Transport-level failure talking to a backend.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// A single failed health probe. Never leaves the monitor.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("connect failed: {0}")]
    Connect(#[from] std::io::Error),

    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("health check returned status {0}")]
    Status(u16),

    #[error("health check request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The probe task panicked or was cancelled.
    #[error("probe aborted: {0}")]
    Aborted(String),
}

/// Configuration loading and validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Ring(#[from] corelib::Error),
}

/// Failures starting or running the HTTP service.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}
