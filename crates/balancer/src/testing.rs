//! Test doubles for the prober and forwarder seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use corelib::Node;
use parking_lot::Mutex;

use crate::error::{ForwardError, ProbeError};
use crate::forward::{Forwarded, Forwarder};
use crate::probe::Prober;
use crate::request::{Operation, Request};

/// What a scripted probe does for a node. Unscripted nodes are `Down`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Up,
    Down,
    Panic,
    Hang,
}

#[derive(Default)]
pub struct ScriptedProber {
    steps: Mutex<HashMap<Node, Step>>,
    calls: AtomicUsize,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, node: &Node, step: Step) {
        self.steps.lock().insert(node.clone(), step);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, node: &Node) -> Result<(), ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().get(node).copied().unwrap_or(Step::Down);
        match step {
            Step::Up => Ok(()),
            Step::Down => Err(ProbeError::Connect(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "scripted refusal",
            ))),
            Step::Panic => panic!("scripted probe panic"),
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }
    }
}

/// A call seen by [`MockForwarder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardCall {
    pub node: Node,
    pub op: Operation,
    pub key: String,
    pub value: Option<String>,
}

/// Answers `200 "<op> <key> handled by <node>"`, or fails with a transport
/// error for nodes marked unreachable.
#[derive(Default)]
pub struct MockForwarder {
    calls: Mutex<Vec<ForwardCall>>,
    unreachable: Mutex<Vec<Node>>,
    status: Mutex<Option<u16>>,
}

impl MockForwarder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, node: &Node) {
        self.unreachable.lock().push(node.clone());
    }

    /// Answer every request with `status` instead of 200.
    pub fn respond_with(&self, status: u16) {
        *self.status.lock() = Some(status);
    }

    pub fn calls(&self) -> Vec<ForwardCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl Forwarder for MockForwarder {
    async fn forward(&self, node: &Node, request: &Request) -> Result<Forwarded, ForwardError> {
        self.calls.lock().push(ForwardCall {
            node: node.clone(),
            op: request.op(),
            key: request.key().to_string(),
            value: request.value().map(str::to_string),
        });

        if self.unreachable.lock().contains(node) {
            return Err(ForwardError::InvalidEndpoint {
                endpoint: node.endpoint().to_string(),
                reason: "connection refused".to_string(),
            });
        }

        let status = self.status.lock().unwrap_or(200);
        Ok(Forwarded::new(
            status,
            format!("{} {} handled by {}", request.op(), request.key(), node),
        ))
    }
}
