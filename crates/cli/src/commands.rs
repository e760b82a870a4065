//! CLI commands.

use std::fmt;

use anyhow::Context;
use balancer::{Balancer, BalancerConfig};
use clap::Subcommand;
use corelib::{Node, Ownership, Topology};
use tracing::info;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve HTTP, probing backends in the background, until Ctrl-C.
    Serve,
    /// Print the owner of each key on the seed ring (no probing).
    Lookup {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Print how the seed ring's space is shared between nodes.
    Inspect,
}

/// What a command produced, rendered for the terminal by `Display`.
#[derive(Debug)]
pub enum CommandResult {
    Served,
    Lookup(Vec<(String, Node)>),
    Inspect(InspectReport),
}

#[derive(Debug)]
pub struct InspectReport {
    pub hash: &'static str,
    pub vnodes_per_node: usize,
    pub positions: usize,
    pub ownership: Vec<Ownership>,
    /// Largest share over the ideal share.
    pub imbalance: Option<f64>,
}

impl Command {
    pub async fn execute(&self, config: &BalancerConfig) -> anyhow::Result<CommandResult> {
        match self {
            Command::Serve => serve(config).await,
            Command::Lookup { keys } => lookup(config, keys),
            Command::Inspect => inspect(config),
        }
    }
}

async fn serve(config: &BalancerConfig) -> anyhow::Result<CommandResult> {
    let balancer =
        Balancer::from_config(config.clone()).context("failed to start balancer")?;
    balancer
        .serve(shutdown_signal())
        .await
        .context("balancer stopped with an error")?;
    Ok(CommandResult::Served)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl-C, shutting down"),
        Err(err) => tracing::error!(error = %err, "failed to listen for Ctrl-C"),
    }
}

fn lookup(config: &BalancerConfig, keys: &[String]) -> anyhow::Result<CommandResult> {
    let ring = config.build_ring()?;
    let owners = keys
        .iter()
        .map(|key| {
            let owner = ring
                .get_owner(key.as_bytes())
                .with_context(|| format!("looking up '{key}'"))?;
            Ok((key.clone(), owner))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(CommandResult::Lookup(owners))
}

fn inspect(config: &BalancerConfig) -> anyhow::Result<CommandResult> {
    let ring = config.build_ring()?;
    let topology = Topology::new(ring.snapshot());
    Ok(CommandResult::Inspect(InspectReport {
        hash: ring.partitioner_name(),
        vnodes_per_node: ring.vnodes_per_node(),
        positions: ring.token_count(),
        ownership: topology.ownership(),
        imbalance: topology.imbalance(),
    }))
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandResult::Served => Ok(()),
            CommandResult::Lookup(owners) => {
                for (key, node) in owners {
                    writeln!(f, "{key}\t{node}")?;
                }
                Ok(())
            }
            CommandResult::Inspect(report) => {
                writeln!(
                    f,
                    "hash: {}  vnodes/node: {}  positions: {}",
                    report.hash, report.vnodes_per_node, report.positions
                )?;
                for entry in &report.ownership {
                    writeln!(
                        f,
                        "{:<40} {:>4} positions {:>7.2}%",
                        entry.node.to_string(),
                        entry.positions,
                        entry.share * 100.0
                    )?;
                }
                if let Some(imbalance) = report.imbalance {
                    writeln!(f, "imbalance: {imbalance:.3}")?;
                }
                Ok(())
            }
        }
    }
}
