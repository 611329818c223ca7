//! Link objects connecting an output slot to an input slot.

use serde::{Deserialize, Serialize};

use crate::id::{LinkId, NodeId};
use crate::types::TypeTag;

/// A connection from one node's output slot to another node's input slot.
///
/// Carries the type declared at connection time. The id is only resolvable
/// within the graph scope that allocated it; nodes may still reference link
/// ids from an enclosing or nested scope after being moved across subgraph
/// boundaries, which is why resolution must search all reachable scopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub origin_node: NodeId,
    pub origin_slot: usize,
    pub target_node: NodeId,
    pub target_slot: usize,
    /// Declared type of the value flowing through this link.
    pub ty: TypeTag,
}

impl Link {
    pub fn new(
        id: LinkId,
        origin_node: NodeId,
        origin_slot: usize,
        target_node: NodeId,
        target_slot: usize,
        ty: TypeTag,
    ) -> Self {
        Link {
            id,
            origin_node,
            origin_slot,
            target_node,
            target_slot,
            ty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_roundtrip() {
        let link = Link::new(LinkId(3), NodeId(1), 0, NodeId(2), 1, TypeTag::new("IMAGE"));
        let json = serde_json::to_string(&link).unwrap();
        let back: Link = serde_json::from_str(&json).unwrap();
        assert_eq!(link, back);
    }
}
