//! Core partitioner trait definitions.

use crate::token::Token;

/// A partitioner is the ring's hash function: it converts arbitrary bytes
/// into a token on the ring.
///
/// Implementations must be pure and deterministic (the same bytes always
/// land on the same token, across processes and restarts) and must spread
/// similar inputs uniformly over the ring so that virtual nodes end up
/// evenly spaced. Partitioners are stateless and thread-safe, allowing
/// concurrent token generation without synchronization overhead.
pub trait Partitioner: Send + Sync + 'static {
    /// Converts a key into a token.
    fn partition(&self, key: &[u8]) -> Token;

    /// Returns the name of this partitioner.
    fn name(&self) -> &'static str;
}
