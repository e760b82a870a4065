//! Immutable ring snapshots.
//!
//! A [`RingState`] is one complete, self-consistent version of the ring.
//! [`HashRing`](super::HashRing) publishes a fresh state for every
//! membership change and never mutates a published one, so a lookup that
//! holds a snapshot sees either all or none of a node's virtual nodes.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use crate::error::{Error, Result};
use crate::node::Node;
use crate::token::Token;
use crate::vnode::VirtualNode;

/// One version of the ring: ordered positions plus the members that hold
/// them.
#[derive(Debug, Clone, Default)]
pub struct RingState {
    /// Virtual node positions: ring position -> physical node.
    tokens: BTreeMap<Token, Node>,
    /// Registered members and the positions each one actually holds
    /// (sorted). A position lost to a collision is not listed.
    members: HashMap<Node, Vec<Token>>,
}

impl RingState {
    /// Find the node owning `token`: the first position clockwise from it,
    /// inclusive, wrapping to the smallest position.
    pub fn owner(&self, token: Token) -> Result<&Node> {
        self.tokens
            .range(token..)
            .next()
            .or_else(|| self.tokens.iter().next())
            .map(|(_, node)| node)
            .ok_or(Error::EmptyRing)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of registered physical nodes.
    pub fn node_count(&self) -> usize {
        self.members.len()
    }

    /// Number of occupied ring positions.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.members.contains_key(node)
    }

    /// Positions held by `node`, in ring order. Empty if not registered.
    pub fn positions_of(&self, node: &Node) -> &[Token] {
        self.members.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Registered nodes, sorted by endpoint.
    pub fn nodes(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self.members.keys().cloned().collect();
        nodes.sort();
        nodes
    }

    /// All `(position, node)` entries in ring order.
    pub fn iter(&self) -> impl Iterator<Item = (&Token, &Node)> {
        self.tokens.iter()
    }

    /// True when `node` is registered and none of `vnodes` is vacant, i.e.
    /// inserting them again would change nothing.
    pub(crate) fn is_settled(&self, node: &Node, vnodes: &[VirtualNode]) -> bool {
        self.contains(node) && vnodes.iter().all(|v| self.tokens.contains_key(&v.token))
    }

    /// True when removing `node` would change nothing.
    pub(crate) fn is_absent(&self, node: &Node, vnodes: &[VirtualNode]) -> bool {
        !self.contains(node) && vnodes.iter().all(|v| self.tokens.get(&v.token) != Some(node))
    }

    /// Register `node` and claim every vacant position among `vnodes`.
    ///
    /// A position already held by another node stays with that node: first
    /// writer wins. Returns the number of positions claimed.
    pub(crate) fn insert_vnodes(&mut self, node: &Node, vnodes: &[VirtualNode]) -> usize {
        let held = self.members.entry(node.clone()).or_default();
        let mut claimed = 0;

        for vnode in vnodes {
            match self.tokens.get(&vnode.token) {
                None => {
                    self.tokens.insert(vnode.token, node.clone());
                    held.push(vnode.token);
                    claimed += 1;
                }
                Some(holder) if holder == node => {}
                Some(holder) => {
                    warn!(
                        token = %vnode.token,
                        node = %node,
                        replica = vnode.index,
                        holder = %holder,
                        "virtual node position collision; keeping existing holder"
                    );
                }
            }
        }

        held.sort_unstable();
        claimed
    }

    /// Unregister `node` and release the positions among `vnodes` that it
    /// holds. Positions held by other nodes are left alone. Returns the
    /// number of positions released.
    pub(crate) fn remove_vnodes(&mut self, node: &Node, vnodes: &[VirtualNode]) -> usize {
        let mut released = 0;
        for vnode in vnodes {
            if self.tokens.get(&vnode.token) == Some(node) {
                self.tokens.remove(&vnode.token);
                released += 1;
            }
        }
        self.members.remove(node);
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vnodes(node: &Node, tokens: &[u128]) -> Vec<VirtualNode> {
        tokens
            .iter()
            .enumerate()
            .map(|(i, t)| VirtualNode::new(Token(*t), node.clone(), i))
            .collect()
    }

    #[test]
    fn test_owner_is_inclusive_successor() {
        let a = Node::new("a");
        let b = Node::new("b");
        let mut state = RingState::default();
        state.insert_vnodes(&a, &vnodes(&a, &[100, 300]));
        state.insert_vnodes(&b, &vnodes(&b, &[200]));

        assert_eq!(state.owner(Token(0)).unwrap(), &a);
        assert_eq!(state.owner(Token(100)).unwrap(), &a);
        assert_eq!(state.owner(Token(101)).unwrap(), &b);
        assert_eq!(state.owner(Token(200)).unwrap(), &b);
        assert_eq!(state.owner(Token(250)).unwrap(), &a);
        // Past the largest position: wrap to the smallest.
        assert_eq!(state.owner(Token(301)).unwrap(), &a);
        assert_eq!(state.owner(Token::MAX).unwrap(), &a);
    }

    #[test]
    fn test_empty_state_has_no_owner() {
        let state = RingState::default();
        assert_eq!(state.owner(Token(42)), Err(Error::EmptyRing));
        assert!(state.is_empty());
    }

    #[test]
    fn test_collision_keeps_first_writer() {
        let a = Node::new("a");
        let b = Node::new("b");
        let mut state = RingState::default();
        assert_eq!(state.insert_vnodes(&a, &vnodes(&a, &[10, 20])), 2);
        assert_eq!(state.insert_vnodes(&b, &vnodes(&b, &[20, 30])), 1);

        assert_eq!(state.owner(Token(20)).unwrap(), &a);
        assert_eq!(state.positions_of(&a), &[Token(10), Token(20)]);
        assert_eq!(state.positions_of(&b), &[Token(30)]);
        assert_eq!(state.token_count(), 3);
    }

    #[test]
    fn test_remove_only_releases_own_positions() {
        let a = Node::new("a");
        let b = Node::new("b");
        let mut state = RingState::default();
        state.insert_vnodes(&a, &vnodes(&a, &[10, 20]));
        state.insert_vnodes(&b, &vnodes(&b, &[20, 30]));

        assert_eq!(state.remove_vnodes(&b, &vnodes(&b, &[20, 30])), 1);
        assert_eq!(state.owner(Token(15)).unwrap(), &a);
        assert_eq!(state.owner(Token(20)).unwrap(), &a);
        assert!(!state.contains(&b));
        assert_eq!(state.token_count(), 2);
    }

    #[test]
    fn test_settled_and_absent() {
        let a = Node::new("a");
        let vs = vnodes(&a, &[1, 2, 3]);
        let mut state = RingState::default();
        assert!(state.is_absent(&a, &vs));
        assert!(!state.is_settled(&a, &vs));

        state.insert_vnodes(&a, &vs);
        assert!(state.is_settled(&a, &vs));
        assert!(!state.is_absent(&a, &vs));

        state.remove_vnodes(&a, &vs);
        assert!(state.is_absent(&a, &vs));
    }
}
