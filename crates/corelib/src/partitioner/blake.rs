//! BLAKE3 partitioner (default).

use crate::partitioner::traits::Partitioner;
use crate::token::Token;

/// Hashes keys with BLAKE3 and keeps the leading 128 bits of the digest.
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake3Partitioner;

impl Partitioner for Blake3Partitioner {
    fn partition(&self, key: &[u8]) -> Token {
        Token::from_digest(blake3::hash(key).as_bytes())
    }

    fn name(&self) -> &'static str {
        "Blake3Partitioner"
    }
}
