//! Balancer metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding binary installs a recorder.
//!
//! - `ringlb_requests_total{op,outcome}` - routed requests by result
//! - `ringlb_probe_failures_total` - failed health probes
//! - `ringlb_ring_members` - physical nodes currently on the ring

use metrics::{counter, describe_counter, describe_gauge, gauge};

use crate::request::Operation;

/// Register metric descriptions with the installed recorder.
pub fn describe() {
    describe_counter!(
        "ringlb_requests_total",
        "Routed client requests by operation and outcome"
    );
    describe_counter!(
        "ringlb_probe_failures_total",
        "Health probes that failed or timed out"
    );
    describe_gauge!(
        "ringlb_ring_members",
        "Physical nodes currently holding ring positions"
    );
}

/// `outcome` is `ok`, `backend_error`, or the failing stage.
pub fn record_request(op: Operation, outcome: &'static str) {
    counter!(
        "ringlb_requests_total",
        "op" => op.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_probe_failure() {
    counter!("ringlb_probe_failures_total").increment(1);
}

pub fn set_ring_members(count: usize) {
    gauge!("ringlb_ring_members").set(count as f64);
}
