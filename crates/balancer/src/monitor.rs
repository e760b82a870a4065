//! Background health monitor.
//!
//! Probes every candidate node on a fixed interval and keeps the ring in
//! line with the result: a node that answers is added, a node that fails
//! or times out is removed. Classification is level-triggered, so every
//! sweep re-applies it; the ring treats repeats as no-ops.
//!
//! Each probe runs in its own task. A probe that errors, panics or
//! outlives `probe_timeout` marks that node down and the sweep moves on.
//! The loop stops when the [`MonitorHandle`] asks it to (or is dropped);
//! the stop signal is checked before every probe and during the idle
//! interval.

use std::sync::Arc;
use std::time::Duration;

use corelib::{HashRing, Node};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ProbeError;
use crate::metrics;
use crate::probe::Prober;

/// Timing knobs for [`HealthMonitor`].
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Upper bound on a single probe.
    pub probe_timeout: Duration,
    /// Idle time between the end of one sweep and the start of the next.
    pub interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(2),
            interval: Duration::from_secs(5),
        }
    }
}

/// Last classification of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeHealth {
    /// Not probed yet.
    #[default]
    Unknown,
    Up,
    Down,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthRecord {
    pub health: NodeHealth,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

/// Per-candidate health, shared between the monitor and the HTTP surface.
#[derive(Debug, Clone, Default)]
pub struct HealthTable {
    records: Arc<DashMap<Node, HealthRecord>>,
}

impl HealthTable {
    /// A table with every candidate in the `Unknown` state.
    pub fn with_candidates<'a>(candidates: impl IntoIterator<Item = &'a Node>) -> Self {
        let records = DashMap::new();
        for node in candidates {
            records.insert(node.clone(), HealthRecord::default());
        }
        Self {
            records: Arc::new(records),
        }
    }

    pub fn get(&self, node: &Node) -> Option<HealthRecord> {
        self.records.get(node).map(|r| r.value().clone())
    }

    pub fn health(&self, node: &Node) -> NodeHealth {
        self.records
            .get(node)
            .map(|r| r.health)
            .unwrap_or_default()
    }

    /// All records, sorted by endpoint.
    pub fn entries(&self) -> Vec<(Node, HealthRecord)> {
        let mut entries: Vec<(Node, HealthRecord)> = self
            .records
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Store the outcome of a probe and return the previous health.
    fn record(&self, node: &Node, outcome: &Result<(), ProbeError>) -> NodeHealth {
        let mut entry = self.records.entry(node.clone()).or_default();
        let previous = entry.health;
        match outcome {
            Ok(()) => {
                entry.health = NodeHealth::Up;
                entry.consecutive_failures = 0;
                entry.last_error = None;
            }
            Err(err) => {
                entry.health = NodeHealth::Down;
                entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
                entry.last_error = Some(err.to_string());
            }
        }
        previous
    }
}

/// Result of one pass over the candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub up: usize,
    pub down: usize,
    /// The stop signal arrived before every candidate was probed.
    pub cancelled: bool,
}

/// Periodic prober that adds and removes nodes on a shared ring.
pub struct HealthMonitor {
    ring: Arc<HashRing>,
    prober: Arc<dyn Prober>,
    candidates: Arc<[Node]>,
    config: MonitorConfig,
    health: HealthTable,
}

impl HealthMonitor {
    /// `candidates` is fixed for the monitor's lifetime.
    pub fn new(
        ring: Arc<HashRing>,
        prober: Arc<dyn Prober>,
        candidates: Vec<Node>,
        config: MonitorConfig,
    ) -> Self {
        let health = HealthTable::with_candidates(&candidates);
        Self {
            ring,
            prober,
            candidates: candidates.into(),
            config,
            health,
        }
    }

    pub fn health(&self) -> HealthTable {
        self.health.clone()
    }

    /// Probe every candidate once and apply the result to the ring.
    pub async fn sweep(&self) -> SweepReport {
        let (_tx, rx) = watch::channel(false);
        self.sweep_until(&rx).await
    }

    async fn sweep_until(&self, shutdown: &watch::Receiver<bool>) -> SweepReport {
        let mut report = SweepReport::default();

        for node in self.candidates.iter() {
            if *shutdown.borrow() {
                report.cancelled = true;
                break;
            }

            let outcome = self.probe(node).await;
            match self.apply(node, outcome) {
                NodeHealth::Up => report.up += 1,
                _ => report.down += 1,
            }
        }

        metrics::set_ring_members(self.ring.node_count());
        report
    }

    /// Run one probe in its own task, bounded by `probe_timeout`.
    async fn probe(&self, node: &Node) -> Result<(), ProbeError> {
        let prober = Arc::clone(&self.prober);
        let target = node.clone();
        let mut task = tokio::spawn(async move { prober.probe(&target).await });

        match tokio::time::timeout(self.config.probe_timeout, &mut task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_err)) => Err(ProbeError::Aborted(join_err.to_string())),
            Err(_) => {
                task.abort();
                Err(ProbeError::Timeout(self.config.probe_timeout))
            }
        }
    }

    fn apply(&self, node: &Node, outcome: Result<(), ProbeError>) -> NodeHealth {
        let previous = self.health.record(node, &outcome);

        match outcome {
            Ok(()) => {
                let changed = self.ring.add_node(node.clone());
                if previous != NodeHealth::Up {
                    info!(node = %node, ?previous, "node is up; added to ring");
                } else {
                    debug!(node = %node, changed, "node still up");
                }
                NodeHealth::Up
            }
            Err(err) => {
                metrics::record_probe_failure();
                let changed = self.ring.remove_node(node);
                if previous != NodeHealth::Down {
                    warn!(node = %node, ?previous, error = %err, "node is down; removed from ring");
                } else {
                    debug!(node = %node, changed, error = %err, "node still down");
                }
                NodeHealth::Down
            }
        }
    }

    /// Start the sweep loop on the current tokio runtime.
    pub fn spawn(self) -> MonitorHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let health = self.health();
        let task = tokio::spawn(self.run(shutdown_rx));
        MonitorHandle {
            shutdown_tx,
            task,
            health,
        }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            candidates = self.candidates.len(),
            interval_ms = self.config.interval.as_millis() as u64,
            probe_timeout_ms = self.config.probe_timeout.as_millis() as u64,
            "health monitor started"
        );

        loop {
            let report = self.sweep_until(&shutdown).await;
            if report.cancelled {
                break;
            }
            debug!(up = report.up, down = report.down, "sweep complete");

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                // Err means the handle is gone: stop as well.
                _ = shutdown.changed() => break,
            }
            if *shutdown.borrow() {
                break;
            }
        }

        info!("health monitor stopped");
    }
}

/// Owner of a running monitor. Dropping it stops the loop.
pub struct MonitorHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
    health: HealthTable,
}

impl MonitorHandle {
    pub fn health(&self) -> HealthTable {
        self.health.clone()
    }

    /// Ask the loop to stop at its next check point.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Stop the loop and wait for it to finish.
    pub async fn shutdown(self) {
        self.stop();
        if let Err(err) = self.task.await {
            warn!(error = %err, "health monitor task ended abnormally");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedProber, Step};

    fn node(name: &str) -> Node {
        Node::new(format!("http://{name}:8080"))
    }

    fn fast_config() -> MonitorConfig {
        MonitorConfig {
            probe_timeout: Duration::from_millis(100),
            interval: Duration::from_millis(10),
        }
    }

    fn monitor(prober: Arc<ScriptedProber>, candidates: Vec<Node>) -> (Arc<HashRing>, HealthMonitor) {
        let ring = Arc::new(HashRing::new());
        let monitor = HealthMonitor::new(ring.clone(), prober, candidates, fast_config());
        (ring, monitor)
    }

    #[tokio::test]
    async fn test_sweep_adds_up_and_removes_down() {
        let prober = Arc::new(ScriptedProber::new());
        prober.set(&node("a"), Step::Up);
        prober.set(&node("b"), Step::Down);
        let (ring, monitor) = monitor(prober, vec![node("a"), node("b")]);

        let report = monitor.sweep().await;

        assert_eq!(report, SweepReport { up: 1, down: 1, cancelled: false });
        assert_eq!(ring.nodes(), vec![node("a")]);
        assert_eq!(monitor.health().health(&node("a")), NodeHealth::Up);
        assert_eq!(monitor.health().health(&node("b")), NodeHealth::Down);
    }

    #[tokio::test]
    async fn test_panicking_probe_only_affects_its_node() {
        let prober = Arc::new(ScriptedProber::new());
        prober.set(&node("a"), Step::Panic);
        prober.set(&node("b"), Step::Up);
        let (ring, monitor) = monitor(prober, vec![node("a"), node("b")]);
        ring.add_node(node("a"));

        let report = monitor.sweep().await;

        assert_eq!(report.down, 1);
        assert_eq!(ring.nodes(), vec![node("b")]);
        let record = monitor.health().get(&node("a")).unwrap();
        assert_eq!(record.health, NodeHealth::Down);
        assert!(record.last_error.unwrap().contains("probe aborted"));
    }

    #[tokio::test]
    async fn test_hanging_probe_times_out() {
        let prober = Arc::new(ScriptedProber::new());
        prober.set(&node("a"), Step::Hang);
        let (ring, monitor) = monitor(prober, vec![node("a")]);
        ring.add_node(node("a"));

        let report = monitor.sweep().await;

        assert_eq!(report.down, 1);
        assert_eq!(ring.node_count(), 0);
        let record = monitor.health().get(&node("a")).unwrap();
        assert!(record.last_error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_repeated_sweeps_are_idempotent() {
        let prober = Arc::new(ScriptedProber::new());
        prober.set(&node("a"), Step::Up);
        prober.set(&node("b"), Step::Down);
        let (ring, monitor) = monitor(prober, vec![node("a"), node("b")]);

        monitor.sweep().await;
        let published = ring.snapshot();
        monitor.sweep().await;
        monitor.sweep().await;

        assert!(Arc::ptr_eq(&published, &ring.snapshot()));
        let record = monitor.health().get(&node("b")).unwrap();
        assert_eq!(record.consecutive_failures, 3);
    }

    #[tokio::test]
    async fn test_recovery_resets_failures() {
        let prober = Arc::new(ScriptedProber::new());
        prober.set(&node("a"), Step::Down);
        let (ring, monitor) = monitor(prober.clone(), vec![node("a")]);

        monitor.sweep().await;
        monitor.sweep().await;
        prober.set(&node("a"), Step::Up);
        monitor.sweep().await;

        let record = monitor.health().get(&node("a")).unwrap();
        assert_eq!(record.health, NodeHealth::Up);
        assert_eq!(record.consecutive_failures, 0);
        assert!(record.last_error.is_none());
        assert!(ring.contains(&node("a")));
    }

    #[tokio::test]
    async fn test_spawned_monitor_stops_on_shutdown() {
        let prober = Arc::new(ScriptedProber::new());
        prober.set(&node("a"), Step::Up);
        let (ring, monitor) = monitor(prober.clone(), vec![node("a")]);

        let handle = monitor.spawn();
        tokio::time::timeout(Duration::from_secs(2), async {
            while !ring.contains(&node("a")) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert!(handle.is_running());

        tokio::time::timeout(Duration::from_secs(2), handle.shutdown())
            .await
            .unwrap();

        // No more sweeps after shutdown.
        let calls = prober.calls();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(prober.calls(), calls);
    }

    #[tokio::test]
    async fn test_cancelled_sweep_stops_between_probes() {
        let prober = Arc::new(ScriptedProber::new());
        let (_ring, monitor) = monitor(prober.clone(), vec![node("a"), node("b")]);
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let report = monitor.sweep_until(&rx).await;

        assert!(report.cancelled);
        assert_eq!(prober.calls(), 0);
    }
}
