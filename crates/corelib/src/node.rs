//! Node abstractions for the consistent hash ring.
//!
//! A node is one backend, identified by its endpoint (typically a base URL
//! such as `http://10.0.0.7:8081`). Two nodes are the same node exactly when
//! their endpoints are equal; that identity is what ring membership is keyed
//! on.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// Logical backend participating in the ring.
///
/// Immutable and cheap to clone: the endpoint is shared, so clones held by
/// the ring, the health monitor, and in-flight requests all point at the
/// same allocation.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Node {
    endpoint: Arc<str>,
}

impl Node {
    /// Construct a node from its endpoint identifier.
    ///
    /// The endpoint is opaque to the ring; it is only hashed and compared.
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// Like [`Node::new`], but rejects blank endpoints and endpoints that
    /// contain whitespace.
    pub fn parse(endpoint: &str) -> Result<Self> {
        if endpoint.trim().is_empty() {
            return Err(Error::InvalidNode("endpoint is empty".to_string()));
        }
        if endpoint.chars().any(char::is_whitespace) {
            return Err(Error::InvalidNode(format!(
                "endpoint '{endpoint}' contains whitespace"
            )));
        }
        Ok(Self::new(endpoint))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Label hashed to place this node's `index`-th virtual node.
    pub fn vnode_label(&self, index: usize) -> String {
        format!("{}#{}", self.endpoint, index)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.endpoint)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.endpoint)
    }
}

impl From<&str> for Node {
    fn from(endpoint: &str) -> Self {
        Node::new(endpoint)
    }
}

impl From<String> for Node {
    fn from(endpoint: String) -> Self {
        Node::new(endpoint)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identity_is_by_endpoint() {
        let a = Node::new("http://localhost:8081");
        let b = Node::from("http://localhost:8081".to_string());
        let c = Node::new("http://localhost:8082");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Node> = [a.clone(), b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&a));
    }

    #[test]
    fn test_vnode_label() {
        let node = Node::new("http://localhost:8081");
        assert_eq!(node.vnode_label(0), "http://localhost:8081#0");
        assert_eq!(node.vnode_label(4), "http://localhost:8081#4");
    }

    #[test]
    fn test_parse_rejects_blank_endpoints() {
        assert!(Node::parse("").is_err());
        assert!(Node::parse("   ").is_err());
        assert!(Node::parse("http://a b").is_err());
        assert_eq!(Node::parse("http://a:1").unwrap().endpoint(), "http://a:1");
    }

    #[test]
    fn test_display_and_debug() {
        let node = Node::new("http://a:1");
        assert_eq!(node.to_string(), "http://a:1");
        assert_eq!(format!("{node:?}"), "Node(http://a:1)");
    }
}
