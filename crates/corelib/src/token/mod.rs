//! Ring tokens.
//!
//! A token is a position on the ring: an unsigned 128-bit integer in
//! `[0, 2^128)`. Positions wrap from `u128::MAX` back to zero, so every
//! distance is measured clockwise.

use std::fmt;

use serde::{Serialize, Serializer};

/// Number of distinct positions on the ring, as a float (`2^128`).
const RING_SPAN: f64 = 340_282_366_920_938_463_463_374_607_431_768_211_456.0;

/// A position on the consistent hash ring.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Token(pub u128);

impl Token {
    /// Minimum token value (start of ring).
    pub const MIN: Token = Token(0);
    /// Maximum token value (end of ring).
    pub const MAX: Token = Token(u128::MAX);

    /// Build a token from the first 16 bytes of a digest, big-endian.
    ///
    /// Shorter inputs are zero-padded on the right.
    pub fn from_digest(digest: &[u8]) -> Self {
        let mut buf = [0u8; 16];
        let len = digest.len().min(16);
        buf[..len].copy_from_slice(&digest[..len]);
        Token(u128::from_be_bytes(buf))
    }

    /// Clockwise distance from `self` to `other`.
    ///
    /// The distance from a token to itself is zero, not a full turn.
    pub fn distance_to(&self, other: &Self) -> u128 {
        other.0.wrapping_sub(self.0)
    }

    /// Express a clockwise distance as a fraction of the whole ring.
    pub fn ring_fraction(distance: u128) -> f64 {
        distance as f64 / RING_SPAN
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

// u128 is not portable across JSON consumers, so tokens go out as hex.
impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
