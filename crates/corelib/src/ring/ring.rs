//! Hash ring data structure.
//!
//! # Concurrency
//!
//! The ring is copy-on-write. Readers clone an `Arc` to the current
//! [`RingState`] under a short read lock and run the lookup on that
//! snapshot; nothing they do ever waits on a mutation in progress. Writers
//! are serialized by a separate mutex, build the next state from the current
//! one, and publish it with a single pointer swap. Consequences:
//!
//! - A lookup never sees part of a node's virtual nodes: a state is
//!   published only once every one of them has been applied.
//! - A lookup that starts after `add_node`/`remove_node` returns observes
//!   that change.
//! - Re-applying a membership that is already in place (the health monitor
//!   does this every sweep) is detected on the snapshot and publishes
//!   nothing.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::error::{Error, Result};
use crate::node::Node;
use crate::partitioner::{Blake3Partitioner, HashKind, Partitioner};
use crate::ring::state::RingState;
use crate::token::Token;
use crate::vnode::VirtualNode;

/// Virtual nodes per physical node when none is configured.
pub const DEFAULT_VNODES: usize = 5;

/// Consistent hash ring mapping keys to nodes.
///
/// Every member holds `vnodes_per_node` positions, at
/// `partition("<endpoint>#<i>")`. A key is owned by the member holding the
/// first position at or after `partition(key)`, wrapping around.
pub struct HashRing {
    partitioner: Arc<dyn Partitioner>,
    vnodes_per_node: usize,
    state: RwLock<Arc<RingState>>,
    /// Serializes writers; readers never take it.
    writer: Mutex<()>,
}

impl HashRing {
    /// Create an empty ring with the default partitioner and vnode count.
    pub fn new() -> Self {
        Self::from_parts(Arc::new(Blake3Partitioner), DEFAULT_VNODES)
    }

    pub fn builder() -> RingBuilder {
        RingBuilder::new()
    }

    fn from_parts(partitioner: Arc<dyn Partitioner>, vnodes_per_node: usize) -> Self {
        Self {
            partitioner,
            vnodes_per_node,
            state: RwLock::new(Arc::new(RingState::default())),
            writer: Mutex::new(()),
        }
    }

    /// Add a node with all of its virtual nodes.
    ///
    /// Idempotent: positions the node already holds are kept, positions
    /// held by another node are skipped (first writer wins). Returns `true`
    /// if the ring changed.
    pub fn add_node(&self, node: Node) -> bool {
        let vnodes = self.virtual_nodes(&node);

        let _writer = self.writer.lock();
        let current = self.snapshot();
        if current.is_settled(&node, &vnodes) {
            return false;
        }

        let mut next = RingState::clone(&current);
        let claimed = next.insert_vnodes(&node, &vnodes);
        self.publish(next);

        debug!(node = %node, claimed, vnodes = self.vnodes_per_node, "added node to ring");
        true
    }

    /// Remove a node and every position it holds.
    ///
    /// Idempotent: removing an absent node is a no-op. Only positions that
    /// currently map to `node` are released. Returns `true` if the ring
    /// changed.
    pub fn remove_node(&self, node: &Node) -> bool {
        let vnodes = self.virtual_nodes(node);

        let _writer = self.writer.lock();
        let current = self.snapshot();
        if current.is_absent(node, &vnodes) {
            return false;
        }

        let mut next = RingState::clone(&current);
        let released = next.remove_vnodes(node, &vnodes);
        self.publish(next);

        debug!(node = %node, released, "removed node from ring");
        true
    }

    /// Find the node that owns `key`.
    ///
    /// Fails with [`Error::EmptyRing`] when no node is registered.
    pub fn get_owner(&self, key: &[u8]) -> Result<Node> {
        let token = self.partitioner.partition(key);
        self.snapshot().owner(token).cloned()
    }

    /// Like [`HashRing::get_owner`], with the empty ring mapped to `None`.
    pub fn lookup(&self, key: &[u8]) -> Option<Node> {
        self.get_owner(key).ok()
    }

    /// Ring position a key hashes to.
    pub fn position_of(&self, key: &[u8]) -> Token {
        self.partitioner.partition(key)
    }

    /// The current immutable state of the ring.
    pub fn snapshot(&self) -> Arc<RingState> {
        Arc::clone(&self.state.read())
    }

    /// The positions `node` occupies (or would occupy) on this ring.
    pub fn virtual_nodes(&self, node: &Node) -> Vec<VirtualNode> {
        VirtualNode::for_node(self.partitioner.as_ref(), node, self.vnodes_per_node)
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.snapshot().contains(node)
    }

    pub fn node_count(&self) -> usize {
        self.snapshot().node_count()
    }

    pub fn token_count(&self) -> usize {
        self.snapshot().token_count()
    }

    /// Registered nodes, sorted by endpoint.
    pub fn nodes(&self) -> Vec<Node> {
        self.snapshot().nodes()
    }

    /// All `(position, node)` pairs in ring order (for debugging).
    pub fn tokens(&self) -> Vec<(Token, Node)> {
        self.snapshot()
            .iter()
            .map(|(token, node)| (*token, node.clone()))
            .collect()
    }

    pub fn vnodes_per_node(&self) -> usize {
        self.vnodes_per_node
    }

    pub fn partitioner_name(&self) -> &'static str {
        self.partitioner.name()
    }

    fn publish(&self, next: RingState) {
        *self.state.write() = Arc::new(next);
    }
}

impl Default for HashRing {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.snapshot();
        f.debug_struct("HashRing")
            .field("partitioner", &self.partitioner.name())
            .field("vnodes_per_node", &self.vnodes_per_node)
            .field("nodes", &state.node_count())
            .field("tokens", &state.token_count())
            .finish()
    }
}

/// Builder for [`HashRing`].
///
/// ```rust
/// use corelib::ring::RingBuilder;
/// use corelib::Node;
///
/// let ring = RingBuilder::new()
///     .with_vnodes(8)
///     .add_node(Node::new("http://localhost:8081"))
///     .add_node(Node::new("http://localhost:8082"))
///     .build()
///     .unwrap();
/// assert_eq!(ring.token_count(), 16);
/// ```
pub struct RingBuilder {
    partitioner: Arc<dyn Partitioner>,
    vnodes_per_node: usize,
    nodes: Vec<Node>,
}

impl RingBuilder {
    pub fn new() -> Self {
        Self {
            partitioner: Arc::new(Blake3Partitioner),
            vnodes_per_node: DEFAULT_VNODES,
            nodes: Vec::new(),
        }
    }

    /// Number of virtual nodes per physical node (must be at least 1).
    pub fn with_vnodes(mut self, vnodes_per_node: usize) -> Self {
        self.vnodes_per_node = vnodes_per_node;
        self
    }

    pub fn with_partitioner(mut self, partitioner: Arc<dyn Partitioner>) -> Self {
        self.partitioner = partitioner;
        self
    }

    pub fn with_hash(self, kind: HashKind) -> Self {
        self.with_partitioner(kind.build())
    }

    /// Seed the ring with `node`.
    pub fn add_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn add_nodes(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.nodes.extend(nodes);
        self
    }

    pub fn build(self) -> Result<HashRing> {
        if self.vnodes_per_node == 0 {
            return Err(Error::InvalidConfig(
                "vnodes per node must be at least 1".to_string(),
            ));
        }

        let ring = HashRing::from_parts(self.partitioner, self.vnodes_per_node);
        for node in self.nodes {
            ring.add_node(node);
        }
        Ok(ring)
    }
}

impl Default for RingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_is_not_affected_by_later_mutations() {
        let ring = HashRing::new();
        ring.add_node(Node::new("a"));
        let before = ring.snapshot();

        ring.add_node(Node::new("b"));
        ring.remove_node(&Node::new("a"));

        assert_eq!(before.node_count(), 1);
        assert!(before.contains(&Node::new("a")));
        assert_eq!(ring.nodes(), vec![Node::new("b")]);
    }

    #[test]
    fn test_noop_mutations_do_not_publish() {
        let ring = HashRing::new();
        assert!(ring.add_node(Node::new("a")));
        let published = ring.snapshot();

        assert!(!ring.add_node(Node::new("a")));
        assert!(!ring.remove_node(&Node::new("zzz")));
        assert!(Arc::ptr_eq(&published, &ring.snapshot()));
    }

    #[test]
    fn test_builder_rejects_zero_vnodes() {
        let err = RingBuilder::new().with_vnodes(0).build().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_builder_with_hash() {
        let ring = RingBuilder::new().with_hash(HashKind::Xxh3).build().unwrap();
        assert_eq!(ring.partitioner_name(), "Xxh3Partitioner");
        assert_eq!(ring.vnodes_per_node(), DEFAULT_VNODES);
    }

    #[test]
    fn test_debug_summarizes_ring() {
        let ring = RingBuilder::new()
            .with_vnodes(3)
            .add_node(Node::new("a"))
            .build()
            .unwrap();
        let rendered = format!("{ring:?}");
        assert!(rendered.contains("Blake3Partitioner"));
        assert!(rendered.contains("tokens: 3"));
    }
}
