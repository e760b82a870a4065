//! Health probes.
//!
//! A probe answers one question: is this node reachable right now? The
//! monitor runs each probe in its own task under a timeout, so a prober
//! only has to report failures it can see.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use corelib::Node;
use serde::Deserialize;
use tokio::net::TcpStream;

use crate::endpoint;
use crate::error::{ProbeError, ServeError};

#[async_trait]
pub trait Prober: Send + Sync + 'static {
    async fn probe(&self, node: &Node) -> Result<(), ProbeError>;
}

/// Reachability by opening a TCP connection to the endpoint's host and
/// port (scheme default when the endpoint has none).
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProber;

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, node: &Node) -> Result<(), ProbeError> {
        let (host, port) =
            endpoint::socket_target(node.endpoint()).map_err(|reason| {
                ProbeError::InvalidEndpoint {
                    endpoint: node.endpoint().to_string(),
                    reason,
                }
            })?;
        TcpStream::connect((host.as_str(), port)).await?;
        Ok(())
    }
}

/// `GET <endpoint><path>`; any 2xx counts as up.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
    path: String,
}

impl HttpProber {
    pub fn new(path: impl Into<String>, timeout: Duration) -> Result<Self, ServeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            path: path.into(),
        })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, node: &Node) -> Result<(), ProbeError> {
        let url = endpoint::join(node.endpoint(), &self.path).map_err(|reason| {
            ProbeError::InvalidEndpoint {
                endpoint: node.endpoint().to_string(),
                reason,
            }
        })?;
        let status = self.client.get(url).send().await?.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::Status(status.as_u16()))
        }
    }
}

/// Probe strategy selected in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    #[default]
    Tcp,
    Http,
}

impl ProbeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::Tcp => "tcp",
            ProbeKind::Http => "http",
        }
    }

    /// Instantiate the prober. `path` and `timeout` only matter for HTTP.
    pub fn build(&self, path: &str, timeout: Duration) -> Result<Arc<dyn Prober>, ServeError> {
        Ok(match self {
            ProbeKind::Tcp => Arc::new(TcpProber),
            ProbeKind::Http => Arc::new(HttpProber::new(path, timeout)?),
        })
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
