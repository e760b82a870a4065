//! Virtual node abstractions.
//!
//! # Virtual Nodes (VNodes) Concept
//!
//! With a single token per physical node, a handful of nodes cut the ring
//! into arcs of wildly different lengths, and so into wildly different
//! loads. Giving every node V tokens (virtual nodes) averages those arcs
//! out: each node's share of the ring is the sum of V independent arcs.
//!
//! The `i`-th virtual node of a node sits at `partition("<endpoint>#<i>")`,
//! for `i` in `0..V`. The placement is a pure function of the endpoint, V
//! and the partitioner, so removing a node can recompute exactly which
//! positions it occupied.

use std::fmt;

use crate::node::Node;
use crate::partitioner::Partitioner;
use crate::token::Token;

/// A virtual node on the hash ring.
///
/// Represents a single token position owned by a physical node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualNode {
    /// Token position on the ring.
    pub token: Token,

    /// The physical node that owns this virtual node.
    pub node: Node,

    /// Replica index in `0..V`.
    pub index: usize,
}

impl VirtualNode {
    #[inline]
    pub fn new(token: Token, node: Node, index: usize) -> Self {
        Self { token, node, index }
    }

    /// Place the `index`-th virtual node of `node` by hashing its label.
    pub fn from_index(partitioner: &dyn Partitioner, node: &Node, index: usize) -> Self {
        let token = partitioner.partition(node.vnode_label(index).as_bytes());
        Self::new(token, node.clone(), index)
    }

    /// All `count` virtual nodes of `node`, in replica-index order.
    pub fn for_node(partitioner: &dyn Partitioner, node: &Node, count: usize) -> Vec<Self> {
        (0..count)
            .map(|index| Self::from_index(partitioner, node, index))
            .collect()
    }

    /// Clockwise distance to another virtual node.
    #[inline]
    pub fn distance_to(&self, other: &Self) -> u128 {
        self.token.distance_to(&other.token)
    }
}

impl fmt::Display for VirtualNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VNode(token={}, node={}#{})", self.token, self.node, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partitioner::Blake3Partitioner;

    #[test]
    fn test_vnode_from_index() {
        let node = Node::new("http://localhost:8081");
        let vnode0 = VirtualNode::from_index(&Blake3Partitioner, &node, 0);
        let vnode1 = VirtualNode::from_index(&Blake3Partitioner, &node, 1);

        assert_ne!(vnode0.token, vnode1.token);
        assert_eq!(vnode0.node, vnode1.node);
        assert_eq!(
            vnode0.token,
            Blake3Partitioner.partition(b"http://localhost:8081#0")
        );
    }

    #[test]
    fn test_for_node_is_reproducible() {
        let node = Node::new("http://localhost:8082");
        let first = VirtualNode::for_node(&Blake3Partitioner, &node, 5);
        let second = VirtualNode::for_node(&Blake3Partitioner, &node, 5);
        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
        assert!(first.iter().enumerate().all(|(i, v)| v.index == i));
    }

    #[test]
    fn test_vnode_distance_and_ordering() {
        let node = Node::new("n");
        let vnode1 = VirtualNode::new(Token(100), node.clone(), 0);
        let vnode2 = VirtualNode::new(Token(200), node, 1);

        assert_eq!(vnode1.distance_to(&vnode2), 100);
        assert!(vnode1 < vnode2);
    }
}
