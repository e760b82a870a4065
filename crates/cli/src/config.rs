//! Command-line arguments and startup configuration.

use std::path::PathBuf;

use anyhow::Context;
use balancer::BalancerConfig;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::{Command, CommandResult};

/// Consistent-hashing load balancer.
#[derive(Parser, Debug)]
#[command(name = "ringlb", version, about, long_about = None)]
pub struct CliConfig {
    /// Path to a TOML configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Listen address, overriding `server.listen_addr`.
    #[arg(long, global = true)]
    pub listen: Option<String>,

    /// Backend endpoint; repeat for several. Replaces `ring.nodes`.
    #[arg(long = "node", global = true)]
    pub nodes: Vec<String>,

    /// Virtual nodes per backend, overriding `ring.vnodes`.
    #[arg(long, global = true)]
    pub vnodes: Option<usize>,

    /// Defaults to `serve`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl CliConfig {
    /// Configuration file (or defaults) with command-line overrides applied.
    pub fn load(&self) -> anyhow::Result<BalancerConfig> {
        let mut config = match &self.config {
            Some(path) => BalancerConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => BalancerConfig::default(),
        };

        if let Some(listen) = &self.listen {
            config.server.listen_addr = listen.clone();
        }
        if !self.nodes.is_empty() {
            config.ring.nodes = self.nodes.clone();
        }
        if let Some(vnodes) = self.vnodes {
            config.ring.vnodes = vnodes;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    pub async fn run(self) -> anyhow::Result<CommandResult> {
        let config = self.load()?;
        init_tracing(&config.log.level);

        let command = self.command.unwrap_or(Command::Serve);
        command.execute(&config).await
    }
}

/// Install the fmt subscriber on stderr. `RUST_LOG` wins over `level`.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
