//! The schema-by-name store.
//!
//! An explicit registry object owned by the editor session (not a process
//! global), rebuilt from scratch by scanning all reachable `PipeIn` nodes
//! each time a name-based lookup is about to happen. Full rebuild means
//! staleness cannot persist across a resolution call; the single-threaded
//! event model makes the lack of a lock safe.

use indexmap::IndexMap;

use dynpipe_core::graph::Graph;
use dynpipe_core::node::NodeClass;
use dynpipe_core::schema::Schema;

use crate::infer::infer_schema;
use crate::scope::ScopeIndex;

/// Pipe-name to schema mapping, rebuilt on demand.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, Schema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        SchemaRegistry::default()
    }

    /// Discards the current contents and rescans every reachable `PipeIn`.
    ///
    /// A producer's stored schema is preferred; an absent or empty stored
    /// schema falls back to live inference. Unnamed producers and empty
    /// schemas are not registered. On duplicate names the last scanned
    /// producer wins, matching the original store's overwrite behavior.
    pub fn rebuild(&mut self, root: &Graph) {
        self.schemas.clear();
        let scope = ScopeIndex::build(root);
        for node in scope.nodes_of_class(NodeClass::PipeIn) {
            let Some(name) = node.pipe_name() else {
                continue;
            };
            let schema = match node.stored_schema() {
                Some(stored) if !stored.is_empty() => stored,
                _ => infer_schema(node, &scope),
            };
            if !schema.is_empty() {
                self.schemas.insert(name, schema);
            }
        }
    }

    /// Name-based lookup. Callers rebuild first.
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynpipe_core::id::{GraphId, NodeId};
    use dynpipe_core::node::Node;
    use dynpipe_core::types::TypeTag;

    fn named_pipe_in(id: u64, name: &str) -> Node {
        let mut node = Node::pipe_in(NodeId(id));
        node.set_pipe_name(name);
        node
    }

    #[test]
    fn rebuild_prefers_stored_schema() {
        let mut g = Graph::new(GraphId(0));
        let mut producer = named_pipe_in(1, "main");
        let mut schema = Schema::new();
        schema.push("image", TypeTag::new("IMAGE"));
        producer.store_schema(&schema, 1);
        g.add_node(producer);

        let mut registry = SchemaRegistry::new();
        registry.rebuild(&g);

        assert_eq!(registry.get("main"), Some(&schema));
    }

    #[test]
    fn rebuild_infers_when_store_is_empty() {
        let mut g = Graph::new(GraphId(0));
        let mut src = Node::plain(NodeId(1));
        src.add_output("a", TypeTag::new("MASK"));
        g.add_node(src);
        let mut producer = named_pipe_in(2, "main");
        producer.add_input("optional", TypeTag::wildcard());
        g.add_node(producer);
        g.connect(NodeId(1), 0, NodeId(2), 0, TypeTag::new("MASK")).unwrap();

        let mut registry = SchemaRegistry::new();
        registry.rebuild(&g);

        let schema = registry.get("main").unwrap();
        assert_eq!(schema.field(0).unwrap().name, "mask");
    }

    #[test]
    fn unnamed_and_empty_producers_skipped() {
        let mut g = Graph::new(GraphId(0));
        // Unnamed, even with a stored schema.
        let mut unnamed = Node::pipe_in(NodeId(1));
        let mut schema = Schema::new();
        schema.push("image", TypeTag::new("IMAGE"));
        unnamed.store_schema(&schema, 1);
        g.add_node(unnamed);
        // Named but with nothing connected and nothing stored.
        g.add_node(named_pipe_in(2, "empty"));

        let mut registry = SchemaRegistry::new();
        registry.rebuild(&g);

        assert!(registry.is_empty());
    }

    #[test]
    fn rebuild_replaces_previous_contents() {
        let mut g = Graph::new(GraphId(0));
        let mut producer = named_pipe_in(1, "old");
        let mut schema = Schema::new();
        schema.push("latent", TypeTag::new("LATENT"));
        producer.store_schema(&schema, 1);
        g.add_node(producer);

        let mut registry = SchemaRegistry::new();
        registry.rebuild(&g);
        assert!(registry.get("old").is_some());

        g.find_node_mut(NodeId(1)).unwrap().set_pipe_name("new");
        registry.rebuild(&g);
        assert!(registry.get("old").is_none());
        assert!(registry.get("new").is_some());
    }
}
