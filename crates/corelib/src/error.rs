//! Error types for the core library.

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
///
/// Collisions, duplicate adds and removals of absent nodes are not errors:
/// the ring treats them as no-ops.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Lookup on a ring with no registered node.
    #[error("ring is empty: no nodes available")]
    EmptyRing,
    /// Invalid node configuration
    #[error("invalid node: {0}")]
    InvalidNode(String),
    /// Invalid ring configuration
    #[error("invalid ring configuration: {0}")]
    InvalidConfig(String),
}
