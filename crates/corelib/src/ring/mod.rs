//! Consistent hash ring implementation.
//!
//! The ring manages token positions and provides efficient lookup
//! operations for finding nodes responsible for keys.

pub mod ring;
pub mod state;

pub use ring::{HashRing, RingBuilder, DEFAULT_VNODES};
pub use state::RingState;

/// Alias for the main ring type (used by lib.rs).
pub type Ring = HashRing;
