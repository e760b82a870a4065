//! SipHash partitioner.

use crate::partitioner::traits::Partitioner;
use crate::token::Token;
use siphasher::sip128::{Hasher128, SipHasher13};
use std::hash::Hasher;

/// Hashes keys with 128-bit SipHash-1-3 under the fixed all-zero key.
///
/// The key is fixed so that placement stays reproducible across processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct SipPartitioner;

impl Partitioner for SipPartitioner {
    fn partition(&self, key: &[u8]) -> Token {
        let mut hasher = SipHasher13::new();
        hasher.write(key);
        let hash = hasher.finish128();
        Token(((hash.h1 as u128) << 64) | hash.h2 as u128)
    }

    fn name(&self) -> &'static str {
        "SipPartitioner"
    }
}
