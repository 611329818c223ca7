//! Producer/consumer resolution.
//!
//! Associating a `PipeIn` with its `PipeOut`s is attempted through an
//! explicit ordered strategy list; the first strategy returning a non-empty
//! result wins. Live downstream traversal is structurally precise but host
//! subgraph boundaries are observed to silently break it in some versions,
//! so the tag, link-type and name strategies exist as fallbacks rather than
//! dead code. Every strategy is a pure function of (scope snapshot,
//! starting node).

use std::collections::HashSet;

use dynpipe_core::id::NodeId;
use dynpipe_core::node::{Node, NodeClass};

use crate::scope::ScopeIndex;

/// Hop limit for backward pipe-chain walks; guarantees termination on
/// malformed or cyclic graphs.
pub const MAX_BACK_HOPS: usize = 50;

/// A consumer-resolution strategy: scope snapshot + producer id in,
/// candidate `PipeOut` ids out.
pub type ConsumerStrategy = fn(&ScopeIndex<'_>, NodeId) -> Vec<NodeId>;

/// The ordered strategy list for resolving a `PipeIn`'s consumers.
pub const CONSUMER_STRATEGIES: [ConsumerStrategy; 4] = [
    downstream_pipe_outs,
    tagged_pipe_outs,
    pipe_typed_outs,
    same_name_pipe_outs,
];

/// Resolves the set of `PipeOut` nodes associated with a producer, trying
/// each strategy in order and returning the first non-empty result.
pub fn resolve_consumers(scope: &ScopeIndex<'_>, pipe_in: NodeId) -> Vec<NodeId> {
    for strategy in CONSUMER_STRATEGIES {
        let found = strategy(scope, pipe_in);
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// Strategy (a): follow the producer's first output's links downstream,
/// passing through reroute nodes, across all reachable scopes, collecting
/// every `PipeOut` encountered. Revisit-protected against cycles.
pub fn downstream_pipe_outs(scope: &ScopeIndex<'_>, pipe_in: NodeId) -> Vec<NodeId> {
    let Some(start) = scope.node(pipe_in) else {
        return Vec::new();
    };
    let mut found = Vec::new();
    let mut visited: HashSet<NodeId> = HashSet::new();
    visited.insert(pipe_in);

    let mut frontier: Vec<&Node> = vec![start];
    while let Some(node) = frontier.pop() {
        let Some(out) = node.outputs.first() else {
            continue;
        };
        for link_id in &out.links {
            let Some(link) = scope.resolve_link(*link_id) else {
                continue;
            };
            let Some(target) = scope.node(link.target_node) else {
                continue;
            };
            if !visited.insert(target.id) {
                continue;
            }
            match target.class {
                NodeClass::PipeOut => found.push(target.id),
                NodeClass::Passthrough => frontier.push(target),
                _ => {}
            }
        }
    }
    found
}

/// Strategy (b): every `PipeOut` previously tagged with a back-reference to
/// this producer's id.
pub fn tagged_pipe_outs(scope: &ScopeIndex<'_>, pipe_in: NodeId) -> Vec<NodeId> {
    scope
        .nodes_of_class(NodeClass::PipeOut)
        .filter(|n| n.source_node_id() == Some(pipe_in))
        .map(|n| n.id)
        .collect()
}

/// Strategy (c): every `PipeOut` whose declared pipe input resolves to a
/// link of the reserved pipe trunk type.
pub fn pipe_typed_outs(scope: &ScopeIndex<'_>, _pipe_in: NodeId) -> Vec<NodeId> {
    scope
        .nodes_of_class(NodeClass::PipeOut)
        .filter(|n| {
            n.pipe_input_index()
                .and_then(|i| n.inputs[i].link)
                .map(|link| scope.link_type(Some(link)).is_pipe())
                .unwrap_or(false)
        })
        .map(|n| n.id)
        .collect()
}

/// Strategy (d), name-based fallback: every `PipeOut` sharing the
/// producer's non-empty pipe name.
pub fn same_name_pipe_outs(scope: &ScopeIndex<'_>, pipe_in: NodeId) -> Vec<NodeId> {
    let Some(name) = scope.node(pipe_in).and_then(Node::pipe_name) else {
        return Vec::new();
    };
    scope
        .nodes_of_class(NodeClass::PipeOut)
        .filter(|n| n.pipe_name().as_deref() == Some(name.as_str()))
        .map(|n| n.id)
        .collect()
}

/// Resolves a `PipeOut`'s originating `PipeIn` by walking its pipe input
/// backward through zero or more passthrough nodes, capped at
/// [`MAX_BACK_HOPS`]. Returns `None` when the chain ends or the cap trips.
pub fn trace_pipe_in(scope: &ScopeIndex<'_>, pipe_out: NodeId) -> Option<NodeId> {
    let mut current = scope.node(pipe_out)?;
    let mut slot = current.pipe_input_index()?;

    for _ in 0..MAX_BACK_HOPS {
        let link = scope.resolve_link(current.inputs.get(slot)?.link?)?;
        let origin = scope.node(link.origin_node)?;
        match origin.class {
            NodeClass::PipeIn => return Some(origin.id),
            NodeClass::Passthrough => {
                current = origin;
                slot = origin.inputs.iter().position(|s| !s.is_widget())?;
            }
            _ => return None,
        }
    }
    tracing::debug!(node = pipe_out.0, "backward pipe trace hit hop limit");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynpipe_core::graph::Graph;
    use dynpipe_core::id::GraphId;
    use dynpipe_core::types::TypeTag;

    /// pipe_in(1) -> passthrough(2) -> pipe_out(3), all in one scope.
    fn chained_graph() -> Graph {
        let mut g = Graph::new(GraphId(0));
        g.add_node(Node::pipe_in(NodeId(1)));
        g.add_node(Node::passthrough(NodeId(2)));
        g.add_node(Node::pipe_out(NodeId(3)));
        g.connect(NodeId(1), 0, NodeId(2), 0, TypeTag::pipe()).unwrap();
        let target_slot = g.node(NodeId(3)).unwrap().pipe_input_index().unwrap();
        g.connect(NodeId(2), 0, NodeId(3), target_slot, TypeTag::pipe()).unwrap();
        g
    }

    #[test]
    fn downstream_follows_passthroughs() {
        let g = chained_graph();
        let scope = ScopeIndex::build(&g);
        assert_eq!(downstream_pipe_outs(&scope, NodeId(1)), vec![NodeId(3)]);
        assert_eq!(resolve_consumers(&scope, NodeId(1)), vec![NodeId(3)]);
    }

    #[test]
    fn downstream_terminates_on_cycle() {
        let mut g = Graph::new(GraphId(0));
        g.add_node(Node::pipe_in(NodeId(1)));
        g.add_node(Node::passthrough(NodeId(2)));
        g.add_node(Node::passthrough(NodeId(3)));
        g.connect(NodeId(1), 0, NodeId(2), 0, TypeTag::pipe()).unwrap();
        g.connect(NodeId(2), 0, NodeId(3), 0, TypeTag::pipe()).unwrap();
        // Close the loop through a second input on node 2.
        g.find_node_mut(NodeId(2)).unwrap().add_input("in2", TypeTag::wildcard());
        g.connect(NodeId(3), 0, NodeId(2), 1, TypeTag::pipe()).unwrap();

        let scope = ScopeIndex::build(&g);
        assert!(downstream_pipe_outs(&scope, NodeId(1)).is_empty());
    }

    #[test]
    fn tag_strategy_finds_back_referenced_consumers() {
        let mut g = Graph::new(GraphId(0));
        g.add_node(Node::pipe_in(NodeId(1)));
        let mut out = Node::pipe_out(NodeId(2));
        out.set_source_node_id(NodeId(1));
        g.add_node(out);

        let scope = ScopeIndex::build(&g);
        assert!(downstream_pipe_outs(&scope, NodeId(1)).is_empty());
        assert_eq!(tagged_pipe_outs(&scope, NodeId(1)), vec![NodeId(2)]);
        // The ordered list falls through to the tag strategy.
        assert_eq!(resolve_consumers(&scope, NodeId(1)), vec![NodeId(2)]);
    }

    #[test]
    fn pipe_type_strategy_scans_trunk_links() {
        // The trunk link exists but the producer's output slot lost it
        // (broken live traversal): only the link-type scan finds the consumer.
        let mut g = Graph::new(GraphId(0));
        g.add_node(Node::pipe_in(NodeId(1)));
        g.add_node(Node::pipe_out(NodeId(2)));
        let slot = g.node(NodeId(2)).unwrap().pipe_input_index().unwrap();
        g.connect(NodeId(1), 0, NodeId(2), slot, TypeTag::pipe()).unwrap();
        g.find_node_mut(NodeId(1)).unwrap().outputs[0].links.clear();

        let scope = ScopeIndex::build(&g);
        assert!(downstream_pipe_outs(&scope, NodeId(1)).is_empty());
        assert_eq!(pipe_typed_outs(&scope, NodeId(1)), vec![NodeId(2)]);
    }

    #[test]
    fn name_strategy_matches_shared_pipe_name() {
        let mut g = Graph::new(GraphId(0));
        let mut pin = Node::pipe_in(NodeId(1));
        pin.set_pipe_name("main");
        g.add_node(pin);
        let mut pout = Node::pipe_out(NodeId(2));
        pout.set_pipe_name("main");
        g.add_node(pout);
        let mut other = Node::pipe_out(NodeId(3));
        other.set_pipe_name("other");
        g.add_node(other);

        let scope = ScopeIndex::build(&g);
        assert_eq!(same_name_pipe_outs(&scope, NodeId(1)), vec![NodeId(2)]);
    }

    #[test]
    fn backward_trace_through_passthrough() {
        let g = chained_graph();
        let scope = ScopeIndex::build(&g);
        assert_eq!(trace_pipe_in(&scope, NodeId(3)), Some(NodeId(1)));
    }

    #[test]
    fn backward_trace_bounded_on_cycle() {
        let mut g = Graph::new(GraphId(0));
        g.add_node(Node::passthrough(NodeId(1)));
        g.add_node(Node::passthrough(NodeId(2)));
        g.add_node(Node::pipe_out(NodeId(3)));
        g.connect(NodeId(1), 0, NodeId(2), 0, TypeTag::pipe()).unwrap();
        g.connect(NodeId(2), 0, NodeId(1), 0, TypeTag::pipe()).unwrap();
        let slot = g.node(NodeId(3)).unwrap().pipe_input_index().unwrap();
        g.connect(NodeId(2), 0, NodeId(3), slot, TypeTag::pipe()).unwrap();

        let scope = ScopeIndex::build(&g);
        assert_eq!(trace_pipe_in(&scope, NodeId(3)), None);
    }

    #[test]
    fn backward_trace_ends_at_plain_node() {
        let mut g = Graph::new(GraphId(0));
        let mut src = Node::plain(NodeId(1));
        src.add_output("x", TypeTag::wildcard());
        g.add_node(src);
        g.add_node(Node::pipe_out(NodeId(2)));
        let slot = g.node(NodeId(2)).unwrap().pipe_input_index().unwrap();
        g.connect(NodeId(1), 0, NodeId(2), slot, TypeTag::wildcard()).unwrap();

        let scope = ScopeIndex::build(&g);
        assert_eq!(trace_pipe_in(&scope, NodeId(2)), None);
    }
}
