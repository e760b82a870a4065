//! Request routing: key -> owner -> forwarder -> uniform result.

use std::fmt;
use std::sync::Arc;

use corelib::{HashRing, Node};
use tracing::{debug, warn};

use crate::error::RouteError;
use crate::forward::Forwarder;
use crate::metrics;
use crate::request::{Operation, Request};

/// A backend's answer, tagged with the node that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOutcome {
    pub op: Operation,
    pub node: Node,
    pub status: u16,
    pub body: String,
}

impl RouteOutcome {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Display for RouteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] sent to {}\nstatus: {}\nresponse: {}",
            self.op, self.node, self.status, self.body
        )
    }
}

/// Routes each request to the owner of its key. Single attempt: a failed
/// forward is reported, never retried on another node.
#[derive(Clone)]
pub struct Router {
    ring: Arc<HashRing>,
    forwarder: Arc<dyn Forwarder>,
}

impl Router {
    pub fn new(ring: Arc<HashRing>, forwarder: Arc<dyn Forwarder>) -> Self {
        Self { ring, forwarder }
    }

    pub fn ring(&self) -> &Arc<HashRing> {
        &self.ring
    }

    pub async fn route(&self, request: Request) -> Result<RouteOutcome, RouteError> {
        let op = request.op();
        let result = self.dispatch(&request).await;

        let outcome = match &result {
            Ok(outcome) if outcome.is_success() => "ok",
            Ok(_) => "backend_error",
            Err(err) => err.stage(),
        };
        metrics::record_request(op, outcome);
        result
    }

    async fn dispatch(&self, request: &Request) -> Result<RouteOutcome, RouteError> {
        let op = request.op();
        let node = self.ring.get_owner(request.key().as_bytes())?;

        match self.forwarder.forward(&node, request).await {
            Ok(forwarded) => {
                debug!(node = %node, op = %op, status = forwarded.status, "request routed");
                Ok(RouteOutcome {
                    op,
                    node,
                    status: forwarded.status,
                    body: forwarded.body,
                })
            }
            Err(source) => {
                warn!(node = %node, op = %op, error = %source, "forwarding failed");
                Err(RouteError::Forward { op, node, source })
            }
        }
    }
}
