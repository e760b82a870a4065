//! Forwarding collaborator: sends a validated request to the node that owns
//! its key.

use std::time::Duration;

use async_trait::async_trait;
use corelib::Node;
use serde::Serialize;
use tracing::debug;

use crate::endpoint;
use crate::error::{ForwardError, ServeError};
use crate::request::{Operation, Request};

/// What a backend answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forwarded {
    pub status: u16,
    pub body: String,
}

impl Forwarded {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request to one node. Implementations must not retry.
#[async_trait]
pub trait Forwarder: Send + Sync + 'static {
    async fn forward(&self, node: &Node, request: &Request) -> Result<Forwarded, ForwardError>;
}

#[derive(Serialize)]
struct PutBody<'a> {
    key: &'a str,
    value: &'a str,
}

/// [`Forwarder`] speaking the backend HTTP protocol:
///
/// - `POST <endpoint>/put` with a JSON `{"key", "value"}` body
/// - `GET <endpoint>/get?key=<key>`
/// - `DELETE <endpoint>/delete?key=<key>`
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: reqwest::Client,
}

impl HttpForwarder {
    /// Build a forwarder whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ServeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, node: &Node, request: &Request) -> Result<Forwarded, ForwardError> {
        let op = request.op();
        let mut url = endpoint::join(node.endpoint(), op.path()).map_err(|reason| {
            ForwardError::InvalidEndpoint {
                endpoint: node.endpoint().to_string(),
                reason,
            }
        })?;

        let builder = match op {
            Operation::Put => self.client.post(url).json(&PutBody {
                key: request.key(),
                value: request.value().unwrap_or_default(),
            }),
            Operation::Get | Operation::Delete => {
                url.query_pairs_mut().append_pair("key", request.key());
                if op == Operation::Get {
                    self.client.get(url)
                } else {
                    self.client.delete(url)
                }
            }
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(node = %node, op = %op, status, "forwarded request");
        Ok(Forwarded { status, body })
    }
}
