//! XXH3 partitioner.
//!
//! Non-cryptographic but well distributed, and noticeably cheaper than
//! BLAKE3 on short keys.

use crate::partitioner::traits::Partitioner;
use crate::token::Token;
use xxhash_rust::xxh3::xxh3_128;

/// Hashes keys with the 128-bit XXH3 variant.
#[derive(Clone, Copy, Debug, Default)]
pub struct Xxh3Partitioner;

impl Partitioner for Xxh3Partitioner {
    fn partition(&self, key: &[u8]) -> Token {
        Token(xxh3_128(key))
    }

    fn name(&self) -> &'static str {
        "Xxh3Partitioner"
    }
}
