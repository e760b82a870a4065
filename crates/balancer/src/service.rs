//! Service bootstrap: wires the ring, the health monitor, the router and
//! the HTTP surface together.

use std::future::Future;
use std::sync::Arc;

use corelib::HashRing;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::BalancerConfig;
use crate::error::ServeError;
use crate::forward::{Forwarder, HttpForwarder};
use crate::http::{self, AppState};
use crate::metrics;
use crate::monitor::HealthMonitor;
use crate::probe::Prober;
use crate::router::Router;

/// A fully assembled balancer, ready to serve.
pub struct Balancer {
    config: BalancerConfig,
    ring: Arc<HashRing>,
    router: Router,
    monitor: HealthMonitor,
}

impl Balancer {
    /// Build from configuration with the HTTP forwarder and the configured
    /// prober.
    pub fn from_config(config: BalancerConfig) -> Result<Self, ServeError> {
        let forwarder = Arc::new(HttpForwarder::new(config.forward_timeout())?);
        let prober = config.build_prober()?;
        Self::with_parts(config, forwarder, prober)
    }

    /// Build from configuration with caller-supplied collaborators.
    pub fn with_parts(
        config: BalancerConfig,
        forwarder: Arc<dyn Forwarder>,
        prober: Arc<dyn Prober>,
    ) -> Result<Self, ServeError> {
        config.validate()?;
        let ring = Arc::new(config.build_ring()?);
        let monitor = HealthMonitor::new(
            Arc::clone(&ring),
            prober,
            config.nodes()?,
            config.monitor_config(),
        );
        let router = Router::new(Arc::clone(&ring), forwarder);

        info!(
            nodes = ring.node_count(),
            vnodes = ring.vnodes_per_node(),
            hash = ring.partitioner_name(),
            "hash ring seeded"
        );

        Ok(Self {
            config,
            ring,
            router,
            monitor,
        })
    }

    pub fn ring(&self) -> &Arc<HashRing> {
        &self.ring
    }

    pub fn config(&self) -> &BalancerConfig {
        &self.config
    }

    /// Bind `server.listen_addr` and serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ServeError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.server.listen_addr.clone();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServeError::Bind { addr, source })?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener. The health monitor runs for as
    /// long as the server does.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServeError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        metrics::describe();
        metrics::set_ring_members(self.ring.node_count());

        let local_addr = listener.local_addr()?;
        let monitor = self.monitor.spawn();
        let app = http::app(AppState::new(self.router, monitor.health()));

        info!(addr = %local_addr, "balancer listening");
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        monitor.shutdown().await;
        info!("balancer stopped");
        served.map_err(ServeError::from)
    }
}
