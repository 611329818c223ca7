//! Graph: a mutable container of nodes and a per-scope link table.
//!
//! Each graph owns its link-id space. Nested subgraphs (a node whose contents
//! are themselves a graph) introduce new scopes; a link id allocated here is
//! not resolvable in a nested or enclosing scope, yet nodes moved across
//! subgraph boundaries may still reference such ids. Multi-scope resolution
//! lives in the synchronization layer; this type only answers for itself.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::{GraphId, LinkId, NodeId};
use crate::link::Link;
use crate::node::Node;
use crate::types::TypeTag;

/// A mutable node container with its own link-id scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    pub id: GraphId,
    nodes: Vec<Node>,
    links: IndexMap<LinkId, Link>,
    next_link_id: u64,
}

impl Graph {
    /// Creates an empty graph scope.
    pub fn new(id: GraphId) -> Self {
        Graph {
            id,
            nodes: Vec::new(),
            links: IndexMap::new(),
            next_link_id: 1,
        }
    }

    // -----------------------------------------------------------------------
    // Node access
    // -----------------------------------------------------------------------

    /// Adds a node to this graph, returning its id.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.push(node);
        id
    }

    /// This graph's direct children, in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// This graph's link table, in allocation order.
    pub fn links(&self) -> &IndexMap<LinkId, Link> {
        &self.links
    }

    /// Looks up a direct child by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Looks up a direct child by id (mutable).
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Looks up a node anywhere in this graph or a nested subgraph,
    /// depth-first, first match wins.
    pub fn find_node(&self, id: NodeId) -> Option<&Node> {
        for node in &self.nodes {
            if node.id == id {
                return Some(node);
            }
            if let Some(sub) = &node.subgraph {
                if let Some(found) = sub.find_node(id) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Mutable variant of [`find_node`](Self::find_node).
    pub fn find_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        for node in &mut self.nodes {
            if node.id == id {
                return Some(node);
            }
            if let Some(sub) = &mut node.subgraph {
                if let Some(found) = sub.find_node_mut(id) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Removes a direct child node, dropping its links in this scope.
    /// Returns the removed node, or `None` if the id is not a direct child.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let pos = self.nodes.iter().position(|n| n.id == id)?;
        let stale: Vec<LinkId> = self
            .links
            .values()
            .filter(|l| l.origin_node == id || l.target_node == id)
            .map(|l| l.id)
            .collect();
        for link_id in stale {
            self.disconnect(link_id);
        }
        Some(self.nodes.remove(pos))
    }

    // -----------------------------------------------------------------------
    // Connectivity
    // -----------------------------------------------------------------------

    /// Connects an output slot to an input slot, both on direct children of
    /// this graph, allocating a link id in this scope.
    ///
    /// An already-connected target input is disconnected first (host
    /// reconnect semantics). Widget-backed targets are rejected.
    pub fn connect(
        &mut self,
        origin: NodeId,
        origin_slot: usize,
        target: NodeId,
        target_slot: usize,
        ty: TypeTag,
    ) -> Result<LinkId, CoreError> {
        let existing = {
            let origin_node = self.node(origin).ok_or(CoreError::NodeNotFound { id: origin })?;
            if origin_slot >= origin_node.outputs.len() {
                return Err(CoreError::SlotOutOfRange {
                    node: origin,
                    kind: "output",
                    index: origin_slot,
                });
            }
            let target_node = self.node(target).ok_or(CoreError::NodeNotFound { id: target })?;
            let slot = target_node.inputs.get(target_slot).ok_or(CoreError::SlotOutOfRange {
                node: target,
                kind: "input",
                index: target_slot,
            })?;
            if slot.is_widget() {
                return Err(CoreError::WidgetSlot {
                    node: target,
                    index: target_slot,
                });
            }
            slot.link
        };
        if let Some(existing) = existing {
            self.disconnect(existing);
        }

        let id = LinkId(self.next_link_id);
        self.next_link_id += 1;
        self.links.insert(
            id,
            Link::new(id, origin, origin_slot, target, target_slot, ty),
        );

        // Both nodes were just validated as direct children.
        if let Some(node) = self.node_mut(origin) {
            node.outputs[origin_slot].links.push(id);
        }
        if let Some(node) = self.node_mut(target) {
            node.inputs[target_slot].link = Some(id);
        }
        Ok(id)
    }

    /// Removes a link from this scope, clearing both endpoints. Unknown ids
    /// are a no-op -- the host may hand us ids from another scope.
    pub fn disconnect(&mut self, id: LinkId) {
        let Some(link) = self.links.shift_remove(&id) else {
            return;
        };
        if let Some(node) = self.node_mut(link.origin_node) {
            if let Some(out) = node.outputs.get_mut(link.origin_slot) {
                out.links.retain(|l| *l != id);
            }
        }
        if let Some(node) = self.node_mut(link.target_node) {
            if let Some(inp) = node.inputs.get_mut(link.target_slot) {
                if inp.link == Some(id) {
                    inp.link = None;
                }
            }
        }
    }

    /// Disconnects whatever link feeds the given input slot of a direct
    /// child. No-op when the slot is absent or unconnected.
    pub fn disconnect_input(&mut self, node: NodeId, slot: usize) {
        let link = self
            .node(node)
            .and_then(|n| n.inputs.get(slot))
            .and_then(|s| s.link);
        if let Some(id) = link {
            self.disconnect(id);
        }
    }

    /// Rewrites the slot indices recorded on every link (in any reachable
    /// scope) that references the given node, using the node's own slot
    /// lists as the authority.
    ///
    /// Slot removal shifts later slot positions; the host's structured
    /// remove would renumber links itself, so the manual equivalent must
    /// too. Safe to call redundantly.
    pub fn reindex_links_for(&mut self, node_id: NodeId) {
        let Some(node) = self.find_node(node_id) else {
            return;
        };
        let inputs: Vec<(LinkId, usize)> = node
            .inputs
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.link.map(|l| (l, i)))
            .collect();
        let outputs: Vec<(LinkId, usize)> = node
            .outputs
            .iter()
            .enumerate()
            .flat_map(|(i, slot)| slot.links.iter().map(move |l| (*l, i)))
            .collect();
        self.apply_link_positions(node_id, &inputs, &outputs);
    }

    fn apply_link_positions(
        &mut self,
        node_id: NodeId,
        inputs: &[(LinkId, usize)],
        outputs: &[(LinkId, usize)],
    ) {
        for (link_id, index) in inputs {
            if let Some(link) = self.links.get_mut(link_id) {
                if link.target_node == node_id {
                    link.target_slot = *index;
                }
            }
        }
        for (link_id, index) in outputs {
            if let Some(link) = self.links.get_mut(link_id) {
                if link.origin_node == node_id {
                    link.origin_slot = *index;
                }
            }
        }
        for node in &mut self.nodes {
            if let Some(sub) = node.subgraph.as_mut() {
                sub.apply_link_positions(node_id, inputs, outputs);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Counts
    // -----------------------------------------------------------------------

    /// Number of direct child nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of links in this scope.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeClass};

    fn two_node_graph() -> Graph {
        let mut g = Graph::new(GraphId(0));
        let mut src = Node::plain(NodeId(1));
        src.add_output("image", TypeTag::new("IMAGE"));
        let mut dst = Node::plain(NodeId(2));
        dst.add_input("in", TypeTag::wildcard());
        g.add_node(src);
        g.add_node(dst);
        g
    }

    #[test]
    fn connect_sets_both_endpoints() {
        let mut g = two_node_graph();
        let link = g.connect(NodeId(1), 0, NodeId(2), 0, TypeTag::new("IMAGE")).unwrap();

        assert_eq!(g.node(NodeId(2)).unwrap().inputs[0].link, Some(link));
        assert_eq!(g.node(NodeId(1)).unwrap().outputs[0].links.as_slice(), [link]);
        assert_eq!(g.links().get(&link).unwrap().ty.as_str(), "IMAGE");
    }

    #[test]
    fn connect_missing_node_errors() {
        let mut g = two_node_graph();
        let err = g.connect(NodeId(99), 0, NodeId(2), 0, TypeTag::wildcard());
        assert!(matches!(err, Err(CoreError::NodeNotFound { id: NodeId(99) })));
    }

    #[test]
    fn connect_widget_slot_rejected() {
        let mut g = two_node_graph();
        let mut widgety = Node::plain(NodeId(3));
        widgety.add_widget_input("seed", "seed");
        g.add_node(widgety);

        let err = g.connect(NodeId(1), 0, NodeId(3), 0, TypeTag::wildcard());
        assert!(matches!(err, Err(CoreError::WidgetSlot { .. })));
    }

    #[test]
    fn reconnect_replaces_existing_link() {
        let mut g = two_node_graph();
        let mut other = Node::plain(NodeId(3));
        other.add_output("mask", TypeTag::new("MASK"));
        g.add_node(other);

        let first = g.connect(NodeId(1), 0, NodeId(2), 0, TypeTag::new("IMAGE")).unwrap();
        let second = g.connect(NodeId(3), 0, NodeId(2), 0, TypeTag::new("MASK")).unwrap();

        assert!(g.links().get(&first).is_none());
        assert_eq!(g.node(NodeId(2)).unwrap().inputs[0].link, Some(second));
        assert!(g.node(NodeId(1)).unwrap().outputs[0].links.is_empty());
    }

    #[test]
    fn disconnect_clears_endpoints() {
        let mut g = two_node_graph();
        let link = g.connect(NodeId(1), 0, NodeId(2), 0, TypeTag::new("IMAGE")).unwrap();
        g.disconnect(link);

        assert_eq!(g.link_count(), 0);
        assert!(g.node(NodeId(2)).unwrap().inputs[0].link.is_none());
        assert!(g.node(NodeId(1)).unwrap().outputs[0].links.is_empty());
    }

    #[test]
    fn disconnect_unknown_id_is_noop() {
        let mut g = two_node_graph();
        g.disconnect(LinkId(12345));
        assert_eq!(g.link_count(), 0);
    }

    #[test]
    fn find_node_descends_into_subgraphs() {
        let mut inner = Graph::new(GraphId(1));
        inner.add_node(Node::plain(NodeId(10)));

        let mut root = Graph::new(GraphId(0));
        root.add_node(Node::new(NodeId(5), NodeClass::Plain).with_subgraph(inner));

        assert!(root.find_node(NodeId(10)).is_some());
        assert!(root.node(NodeId(10)).is_none());
        assert!(root.find_node_mut(NodeId(10)).is_some());
    }

    #[test]
    fn remove_node_drops_its_links() {
        let mut g = two_node_graph();
        g.connect(NodeId(1), 0, NodeId(2), 0, TypeTag::new("IMAGE")).unwrap();

        let removed = g.remove_node(NodeId(2)).unwrap();
        assert_eq!(removed.id, NodeId(2));
        assert_eq!(g.link_count(), 0);
        assert!(g.node(NodeId(1)).unwrap().outputs[0].links.is_empty());
    }

    #[test]
    fn reindex_repairs_target_slots_after_removal() {
        let mut g = two_node_graph();
        // Give the destination a second input and connect to it.
        g.node_mut(NodeId(2)).unwrap().add_input("in2", TypeTag::wildcard());
        let link = g.connect(NodeId(1), 0, NodeId(2), 1, TypeTag::new("IMAGE")).unwrap();

        // Remove the unconnected leading slot; the link's recorded index is
        // now stale until reindexed.
        g.node_mut(NodeId(2)).unwrap().remove_input(0);
        assert_eq!(g.links().get(&link).unwrap().target_slot, 1);

        g.reindex_links_for(NodeId(2));
        assert_eq!(g.links().get(&link).unwrap().target_slot, 0);
    }
}
