//! Multi-scope graph traversal.
//!
//! Slots disconnected from their defining subgraph scope, and link ids only
//! valid in a nested or enclosing scope, are observed in practice; a
//! single-graph lookup is unreliable. [`ScopeIndex`] flattens every graph
//! reachable from a root into one lookup structure, and every resolution the
//! engine performs goes through it.

use std::collections::HashSet;

use indexmap::IndexMap;

use dynpipe_core::graph::Graph;
use dynpipe_core::id::{GraphId, LinkId, NodeId};
use dynpipe_core::link::Link;
use dynpipe_core::node::{Node, NodeClass};
use dynpipe_core::types::TypeTag;

/// A read-only snapshot index over all graphs reachable from a root.
///
/// Build, query, drop: the index borrows the graph tree, so it cannot
/// outlive a mutation phase. Resolution strategies are pure functions of
/// this snapshot.
pub struct ScopeIndex<'g> {
    graphs: Vec<&'g Graph>,
    links: IndexMap<LinkId, &'g Link>,
    nodes: IndexMap<NodeId, &'g Node>,
}

impl<'g> ScopeIndex<'g> {
    /// Walks the root and every nested subgraph, revisit-protected by
    /// [`GraphId`] against malformed or re-entrant nesting. First
    /// registration wins on duplicate link or node ids across scopes.
    pub fn build(root: &'g Graph) -> Self {
        let mut index = ScopeIndex {
            graphs: Vec::new(),
            links: IndexMap::new(),
            nodes: IndexMap::new(),
        };
        let mut seen = HashSet::new();
        index.visit(root, &mut seen);
        index
    }

    fn visit(&mut self, graph: &'g Graph, seen: &mut HashSet<GraphId>) {
        if !seen.insert(graph.id) {
            return;
        }
        self.graphs.push(graph);
        for (id, link) in graph.links() {
            self.links.entry(*id).or_insert(link);
        }
        for node in graph.nodes() {
            self.nodes.entry(node.id).or_insert(node);
            if let Some(sub) = &node.subgraph {
                self.visit(sub, seen);
            }
        }
    }

    /// All visited graphs, root first.
    pub fn graphs(&self) -> &[&'g Graph] {
        &self.graphs
    }

    /// Resolves a link id across every reachable scope.
    pub fn resolve_link(&self, id: LinkId) -> Option<&'g Link> {
        self.links.get(&id).copied()
    }

    /// Declared type of a link, degrading to the wildcard sentinel when the
    /// id is absent or unresolvable in any scope.
    pub fn link_type(&self, id: Option<LinkId>) -> TypeTag {
        match id.and_then(|id| self.resolve_link(id)) {
            Some(link) => link.ty.clone(),
            None => TypeTag::wildcard(),
        }
    }

    /// Flattened node lookup over all reachable graphs.
    pub fn node(&self, id: NodeId) -> Option<&'g Node> {
        self.nodes.get(&id).copied()
    }

    /// Every reachable node, in scope visit order.
    pub fn nodes(&self) -> impl Iterator<Item = &'g Node> + '_ {
        self.nodes.values().copied()
    }

    /// Every reachable node of one class, in scope visit order.
    pub fn nodes_of_class(&self, class: NodeClass) -> impl Iterator<Item = &'g Node> + '_ {
        self.nodes().filter(move |n| n.class == class)
    }
}
