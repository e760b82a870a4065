//! Core library for consistent hashing.
//!
//! This crate provides the fundamental abstractions for routing keys to
//! backend nodes:
//! - 128-bit ring tokens
//! - Partitioners (the ring's pluggable hash functions)
//! - Nodes and virtual nodes
//! - The concurrent hash ring and its immutable snapshots
//! - Ring topology / ownership analysis

pub mod error;
pub mod node;
pub mod partitioner;
pub mod ring;
pub mod token;
pub mod topology;
pub mod vnode;

pub use error::{Error, Result};
pub use node::Node;
pub use partitioner::{HashKind, Partitioner};
pub use ring::{HashRing, Ring, RingBuilder, RingState};
pub use token::Token;
pub use topology::{Ownership, Topology};
pub use vnode::VirtualNode;
