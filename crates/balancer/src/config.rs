//! TOML configuration for the balancer.
//!
//! Every field has a default, so an empty file (or no file) describes the
//! stock three-node local setup:
//!
//! ```toml
//! [server]
//! listen_addr = "0.0.0.0:8080"
//! forward_timeout_ms = 10000
//!
//! [ring]
//! nodes = ["http://localhost:8081", "http://localhost:8082", "http://localhost:8083"]
//! vnodes = 5
//! hash = "blake3"        # blake3 | xxh3 | sip
//!
//! [health]
//! probe = "tcp"          # tcp | http
//! probe_timeout_ms = 2000
//! interval_ms = 5000
//! http_path = "/health"
//!
//! [log]
//! level = "info"
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use corelib::{HashKind, HashRing, Node, RingBuilder};
use serde::Deserialize;

use crate::endpoint;
use crate::error::{ConfigError, ServeError};
use crate::monitor::MonitorConfig;
use crate::probe::{ProbeKind, Prober};

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BalancerConfig {
    pub server: ServerSection,
    pub ring: RingSection,
    pub health: HealthSection,
    pub log: LogSection,
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Address the HTTP surface binds to.
    pub listen_addr: String,
    /// Upper bound on one forwarded request.
    pub forward_timeout_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            forward_timeout_ms: 10_000,
        }
    }
}

/// `[ring]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RingSection {
    /// Candidate backends. Seeded onto the ring at startup and probed by
    /// the health monitor.
    pub nodes: Vec<String>,
    /// Virtual nodes per backend.
    pub vnodes: usize,
    pub hash: HashKind,
}

impl Default for RingSection {
    fn default() -> Self {
        Self {
            nodes: vec![
                "http://localhost:8081".to_string(),
                "http://localhost:8082".to_string(),
                "http://localhost:8083".to_string(),
            ],
            vnodes: corelib::ring::DEFAULT_VNODES,
            hash: HashKind::default(),
        }
    }
}

/// `[health]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HealthSection {
    pub probe: ProbeKind,
    pub probe_timeout_ms: u64,
    /// Idle time between sweeps.
    pub interval_ms: u64,
    /// Path requested by the `http` probe.
    pub http_path: String,
}

impl Default for HealthSection {
    fn default() -> Self {
        Self {
            probe: ProbeKind::default(),
            probe_timeout_ms: 2_000,
            interval_ms: 5_000,
            http_path: "/health".to_string(),
        }
    }
}

/// `[log]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Default filter; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl BalancerConfig {
    /// Read and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.listen_addr.trim().is_empty() {
            return Err(invalid("server.listen_addr must not be empty"));
        }
        if self.server.forward_timeout_ms == 0 {
            return Err(invalid("server.forward_timeout_ms must be greater than 0"));
        }
        if self.ring.vnodes == 0 {
            return Err(invalid("ring.vnodes must be at least 1"));
        }
        if self.ring.nodes.is_empty() {
            return Err(invalid("ring.nodes must list at least one node"));
        }

        let mut seen = HashSet::new();
        for raw in &self.ring.nodes {
            endpoint::parse(raw)
                .map_err(|reason| invalid(format!("node '{raw}': {reason}")))?;
            if !seen.insert(raw.as_str()) {
                return Err(invalid(format!("node '{raw}' is listed twice")));
            }
        }

        if self.health.probe_timeout_ms == 0 {
            return Err(invalid("health.probe_timeout_ms must be greater than 0"));
        }
        if self.health.interval_ms == 0 {
            return Err(invalid("health.interval_ms must be greater than 0"));
        }
        if !self.health.http_path.starts_with('/') {
            return Err(invalid("health.http_path must start with '/'"));
        }
        Ok(())
    }

    /// The candidate list as ring nodes.
    pub fn nodes(&self) -> Result<Vec<Node>, ConfigError> {
        self.ring
            .nodes
            .iter()
            .map(|raw| Node::parse(raw).map_err(ConfigError::from))
            .collect()
    }

    /// A ring seeded with every candidate.
    pub fn build_ring(&self) -> Result<HashRing, ConfigError> {
        Ok(RingBuilder::new()
            .with_hash(self.ring.hash)
            .with_vnodes(self.ring.vnodes)
            .add_nodes(self.nodes()?)
            .build()?)
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            probe_timeout: Duration::from_millis(self.health.probe_timeout_ms),
            interval: Duration::from_millis(self.health.interval_ms),
        }
    }

    pub fn forward_timeout(&self) -> Duration {
        Duration::from_millis(self.server.forward_timeout_ms)
    }

    pub fn build_prober(&self) -> Result<Arc<dyn Prober>, ServeError> {
        self.health.probe.build(
            &self.health.http_path,
            Duration::from_millis(self.health.probe_timeout_ms),
        )
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}
