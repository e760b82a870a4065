//! Partitioner abstraction for consistent hashing.
//!
//! Partitioners are responsible for converting keys (and virtual node
//! labels) into tokens that can be placed on the hash ring. All of them
//! produce 128-bit tokens, which keeps the birthday-collision probability
//! across every virtual node of a cluster negligible.

pub mod blake;
pub mod sip;
pub mod traits;
pub mod xxh3;

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

pub use blake::Blake3Partitioner;
pub use sip::SipPartitioner;
pub use traits::Partitioner;
pub use xxh3::Xxh3Partitioner;

/// Selects one of the built-in partitioners, e.g. from configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashKind {
    #[default]
    Blake3,
    Xxh3,
    Sip,
}

impl HashKind {
    /// Instantiate the selected partitioner.
    pub fn build(self) -> Arc<dyn Partitioner> {
        match self {
            HashKind::Blake3 => Arc::new(Blake3Partitioner),
            HashKind::Xxh3 => Arc::new(Xxh3Partitioner),
            HashKind::Sip => Arc::new(SipPartitioner),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HashKind::Blake3 => "blake3",
            HashKind::Xxh3 => "xxh3",
            HashKind::Sip => "sip",
        }
    }
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
