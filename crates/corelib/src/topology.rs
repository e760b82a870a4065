//! Ring topology: ownership views over a ring snapshot.
//!
//! A key at position `p` belongs to the first virtual node at or after `p`,
//! so each virtual node owns the arc `(predecessor, position]`. Summing those
//! arcs per physical node gives the share of the key space, and so the
//! expected share of traffic, that each node receives.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::node::Node;
use crate::ring::RingState;
use crate::token::Token;

/// Share of the ring owned by one node.
#[derive(Debug, Clone, Serialize)]
pub struct Ownership {
    pub node: Node,
    /// Positions the node holds.
    pub positions: usize,
    /// Fraction of the ring space, in `[0, 1]`.
    pub share: f64,
}

/// Read-only ownership analysis of one ring snapshot.
#[derive(Debug, Clone)]
pub struct Topology {
    state: Arc<RingState>,
}

impl Topology {
    pub fn new(state: Arc<RingState>) -> Self {
        Self { state }
    }

    /// Per-node ownership, sorted by endpoint. Shares sum to 1 on a
    /// non-empty ring.
    pub fn ownership(&self) -> Vec<Ownership> {
        let mut shares: HashMap<&Node, f64> = HashMap::new();
        let entries: Vec<(&Token, &Node)> = self.state.iter().collect();

        if let [(_, only)] = entries.as_slice() {
            shares.insert(*only, 1.0);
        } else if let Some((last, _)) = entries.last() {
            let mut predecessor = **last;
            for (token, node) in &entries {
                let arc = predecessor.distance_to(token);
                *shares.entry(*node).or_insert(0.0) += Token::ring_fraction(arc);
                predecessor = **token;
            }
        }

        self.state
            .nodes()
            .into_iter()
            .map(|node| Ownership {
                positions: self.state.positions_of(&node).len(),
                share: shares.get(&node).copied().unwrap_or(0.0),
                node,
            })
            .collect()
    }

    /// Positions held by `node`, in ring order.
    pub fn positions_of(&self, node: &Node) -> Vec<Token> {
        self.state.positions_of(node).to_vec()
    }

    /// Ratio of the largest share to the ideal share (`1 / nodes`).
    ///
    /// 1.0 is a perfectly even ring; `None` for an empty ring.
    pub fn imbalance(&self) -> Option<f64> {
        let ownership = self.ownership();
        if ownership.is_empty() {
            return None;
        }
        let ideal = 1.0 / ownership.len() as f64;
        let max = ownership.iter().map(|o| o.share).fold(0.0, f64::max);
        Some(max / ideal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::RingBuilder;

    fn topology(nodes: usize, vnodes: usize) -> Topology {
        let ring = RingBuilder::new()
            .with_vnodes(vnodes)
            .add_nodes((0..nodes).map(|i| Node::new(format!("http://10.0.0.{i}:8080"))))
            .build()
            .unwrap();
        Topology::new(ring.snapshot())
    }

    #[test]
    fn test_empty_ring_has_no_ownership() {
        let t = topology(0, 5);
        assert!(t.ownership().is_empty());
        assert_eq!(t.imbalance(), None);
    }

    #[test]
    fn test_single_position_owns_everything() {
        let t = topology(1, 1);
        let ownership = t.ownership();
        assert_eq!(ownership.len(), 1);
        assert_eq!(ownership[0].share, 1.0);
        assert_eq!(ownership[0].positions, 1);
    }

    #[test]
    fn test_shares_sum_to_one() {
        let t = topology(4, 16);
        let ownership = t.ownership();
        let total: f64 = ownership.iter().map(|o| o.share).sum();
        assert!((total - 1.0).abs() < 1e-9, "total share {total}");
        assert!(ownership.iter().all(|o| o.share > 0.0 && o.positions == 16));
    }

    #[test]
    fn test_more_vnodes_smooth_the_distribution() {
        // 256 arcs per node keep the largest share well within 50% of ideal.
        let t = topology(4, 256);
        let imbalance = t.imbalance().unwrap();
        assert!(imbalance < 1.5, "imbalance {imbalance}");
    }

    #[test]
    fn test_positions_of_matches_ring() {
        let t = topology(2, 8);
        let node = Node::new("http://10.0.0.0:8080");
        let positions = t.positions_of(&node);
        assert_eq!(positions.len(), 8);
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
