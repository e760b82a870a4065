//! Consistent-hashing load balancer.
//!
//! Routes key-based `PUT`/`GET`/`DELETE` requests to a pool of backend
//! nodes. Ownership comes from a [`corelib::HashRing`] shared between:
//!
//! - the [`router::Router`], which looks up the owner of each key and
//!   forwards the request to it, and
//! - the [`monitor::HealthMonitor`], which probes every candidate node in
//!   the background and adds or removes it from the ring.
//!
//! [`service::Balancer`] assembles both behind the axum app in [`http`].

pub mod config;
pub mod endpoint;
pub mod error;
pub mod forward;
pub mod http;
pub mod metrics;
pub mod monitor;
pub mod probe;
pub mod request;
pub mod router;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use config::BalancerConfig;
pub use error::{ConfigError, ForwardError, ProbeError, RouteError, ServeError};
pub use forward::{Forwarded, Forwarder, HttpForwarder};
pub use monitor::{HealthMonitor, HealthTable, MonitorConfig, MonitorHandle, NodeHealth};
pub use probe::{HttpProber, ProbeKind, Prober, TcpProber};
pub use request::{Operation, Request};
pub use router::{RouteOutcome, Router};
pub use service::Balancer;
