//! Command-line front end for the consistent-hashing load balancer.
//!
//! Provides commands for:
//! - Serving the balancer (`serve`)
//! - Resolving key owners on the seed ring (`lookup`)
//! - Inspecting ring ownership (`inspect`)

pub mod commands;
pub mod config;

pub use commands::{Command, CommandResult};
pub use config::CliConfig;
