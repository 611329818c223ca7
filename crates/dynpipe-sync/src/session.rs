//! The propagation protocol and host lifecycle entry points.
//!
//! [`PipeSession`] is owned by the editor session context and holds the two
//! pieces of cross-node state: the schema-by-name registry and the deferred
//! settle queue. Everything else is recomputed per call from the live graph.
//!
//! All entry points are idempotent: repeated invocation against unchanged
//! connectivity converges to a fixed point with no further mutation. All
//! mutation happens synchronously inside the caller's event dispatch; there
//! is no parallelism here.

use std::time::{SystemTime, UNIX_EPOCH};

use dynpipe_core::graph::Graph;
use dynpipe_core::id::NodeId;
use dynpipe_core::node::NodeClass;
use dynpipe_core::schema::Schema;

use crate::error::SyncError;
use crate::infer::infer_schema;
use crate::registry::SchemaRegistry;
use crate::resolve::{resolve_consumers, trace_pipe_in};
use crate::scope::ScopeIndex;
use crate::sync::{
    normalize_after_load, reset_pipe_out_default, sync_pipe_in_inputs, sync_pipe_out_outputs,
};
use crate::tasks::{PendingQueue, TaskKind};

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Editor-session state for dynamic pipe synchronization.
#[derive(Debug, Default)]
pub struct PipeSession {
    registry: SchemaRegistry,
    pending: PendingQueue,
}

impl PipeSession {
    pub fn new() -> Self {
        PipeSession::default()
    }

    /// The schema-by-name store (rebuilt internally before lookups).
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// The deferred settle queue.
    pub fn pending(&self) -> &PendingQueue {
        &self.pending
    }

    // -----------------------------------------------------------------------
    // Host lifecycle hooks
    // -----------------------------------------------------------------------

    /// Node-created hook for either pipe node class.
    pub fn on_node_created(&mut self, root: &mut Graph, id: NodeId) {
        self.handle_event(root, id, false);
    }

    /// Node-configured/deserialized hook. Runs the post-load normalization
    /// pass for `PipeIn` before the regular refresh.
    pub fn on_node_loaded(&mut self, root: &mut Graph, id: NodeId) {
        self.handle_event(root, id, true);
    }

    /// Connection-changed hook (connect, disconnect, reconnect).
    pub fn on_connections_changed(&mut self, root: &mut Graph, id: NodeId) {
        self.handle_event(root, id, false);
    }

    /// Node-removed hook: cancels any settle task scheduled for the node.
    pub fn on_node_removed(&mut self, id: NodeId) {
        self.pending.cancel(id);
    }

    /// The interactive "Update" control. Failures are logged non-fatally
    /// and leave prior state intact.
    pub fn request_update(&mut self, root: &mut Graph, id: NodeId) {
        let result = match root.find_node(id).map(|n| n.class) {
            Some(NodeClass::PipeIn) => self.refresh_pipe_in(root, id),
            Some(NodeClass::PipeOut) => self.refresh_pipe_out(root, id),
            Some(found) => Err(SyncError::WrongClass {
                id,
                expected: NodeClass::PipeIn,
                found,
            }),
            None => Err(SyncError::NodeNotFound { id }),
        };
        if let Err(err) = result {
            tracing::warn!(node = id.0, %err, "update request failed");
        }
    }

    fn handle_event(&mut self, root: &mut Graph, id: NodeId, loaded: bool) {
        let Some(class) = root.find_node(id).map(|n| n.class) else {
            return;
        };
        match class {
            NodeClass::PipeIn => {
                if loaded {
                    if let Some(node) = root.find_node_mut(id) {
                        normalize_after_load(node);
                    }
                    root.reindex_links_for(id);
                }
                if let Err(err) = self.refresh_pipe_in(root, id) {
                    tracing::warn!(node = id.0, %err, "pipe-in refresh failed");
                }
                self.pending.schedule(id, TaskKind::RefreshPipeIn);
            }
            NodeClass::PipeOut => {
                if let Err(err) = self.refresh_pipe_out(root, id) {
                    tracing::warn!(node = id.0, %err, "pipe-out refresh failed");
                }
                self.pending.schedule(id, TaskKind::RefreshPipeOut);
            }
            _ => {}
        }
    }

    /// Runs every queued settle task. A task whose node is gone or has been
    /// reclassified since scheduling is stale and dropped silently.
    pub fn drain_pending(&mut self, root: &mut Graph) {
        for task in self.pending.drain() {
            let current = root.find_node(task.node).map(|n| n.class);
            let result = match (task.kind, current) {
                (TaskKind::RefreshPipeIn, Some(NodeClass::PipeIn)) => {
                    self.refresh_pipe_in(root, task.node)
                }
                (TaskKind::RefreshPipeOut, Some(NodeClass::PipeOut)) => {
                    self.refresh_pipe_out(root, task.node)
                }
                _ => Ok(()),
            };
            if let Err(err) = result {
                tracing::debug!(node = task.node.0, %err, "deferred settle task failed");
            }
        }
    }

    // -----------------------------------------------------------------------
    // The propagation protocol
    // -----------------------------------------------------------------------

    /// Producer-side update:
    /// 1. normalize the node's inputs;
    /// 2. infer the schema from the normalized connections;
    /// 3. persist schema + timestamp on the node (and name store);
    /// 4. re-apply the schema to the node's own input names;
    /// 5. resolve the associated `PipeOut` set;
    /// 6. push schema, timestamp and back-reference to each and resync
    ///    their outputs.
    pub fn refresh_pipe_in(&mut self, root: &mut Graph, id: NodeId) -> Result<(), SyncError> {
        expect_class(root, id, NodeClass::PipeIn)?;

        // 1. Normalize connection shape before reading types.
        if let Some(node) = root.find_node_mut(id) {
            sync_pipe_in_inputs(node, &Schema::new());
        }
        root.reindex_links_for(id);

        // 2 + 5. Infer and resolve against one read snapshot.
        let (schema, consumers) = {
            let scope = ScopeIndex::build(root);
            let node = scope.node(id).ok_or(SyncError::NodeNotFound { id })?;
            (infer_schema(node, &scope), resolve_consumers(&scope, id))
        };

        // 3 + 4. Persist, then name our own inputs from the fresh schema.
        let timestamp = now_ms();
        if let Some(node) = root.find_node_mut(id) {
            node.store_schema(&schema, timestamp);
            sync_pipe_in_inputs(node, &schema);
        }
        root.reindex_links_for(id);

        // Keep the name store current for later name-based lookups.
        self.registry.rebuild(root);

        // 6. Push to every resolved consumer.
        for consumer in consumers {
            {
                let Some(node) = root.find_node_mut(consumer) else {
                    continue;
                };
                if node.class != NodeClass::PipeOut {
                    continue;
                }
                node.store_schema(&schema, timestamp);
                node.set_source_node_id(id);
                if schema.is_empty() {
                    reset_pipe_out_default(node);
                } else {
                    sync_pipe_out_outputs(node, &schema);
                }
            }
            root.reindex_links_for(consumer);
        }
        Ok(())
    }

    /// Consumer-side update, used when no push has happened yet (e.g. on
    /// load): trace the producer backward through the pipe chain, read or
    /// recompute its schema and apply it; fall back to the name store; fall
    /// back to the minimal default.
    pub fn refresh_pipe_out(&mut self, root: &mut Graph, id: NodeId) -> Result<(), SyncError> {
        expect_class(root, id, NodeClass::PipeOut)?;

        // Structural resolution: walk the pipe input back to a producer.
        let (mut schema, source) = {
            let scope = ScopeIndex::build(root);
            match trace_pipe_in(&scope, id) {
                Some(src) => {
                    let producer = scope.node(src);
                    let found = producer
                        .and_then(|n| n.stored_schema())
                        .filter(|s| !s.is_empty())
                        .or_else(|| producer.map(|n| infer_schema(n, &scope)));
                    (found, Some(src))
                }
                None => (None, None),
            }
        };

        // Name-based fallback through the rebuilt-from-scratch store. The
        // producer id is unknown on this path, so no back-reference is set.
        if schema.as_ref().map_or(true, Schema::is_empty) {
            if let Some(name) = root.find_node(id).and_then(|n| n.pipe_name()) {
                self.registry.rebuild(root);
                schema = self.registry.get(&name).cloned();
            }
        }

        let timestamp = now_ms();
        {
            let node = root
                .find_node_mut(id)
                .ok_or(SyncError::NodeNotFound { id })?;
            match schema {
                Some(ref schema) if !schema.is_empty() => {
                    node.store_schema(schema, timestamp);
                    if let Some(src) = source {
                        node.set_source_node_id(src);
                    }
                    sync_pipe_out_outputs(node, schema);
                }
                _ => reset_pipe_out_default(node),
            }
        }
        root.reindex_links_for(id);
        Ok(())
    }
}

fn expect_class(root: &Graph, id: NodeId, expected: NodeClass) -> Result<(), SyncError> {
    let node = root.find_node(id).ok_or(SyncError::NodeNotFound { id })?;
    if node.class != expected {
        return Err(SyncError::WrongClass {
            id,
            expected,
            found: node.class,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynpipe_core::id::GraphId;
    use dynpipe_core::node::Node;
    use dynpipe_core::slot::PLACEHOLDER_NAME;
    use dynpipe_core::types::TypeTag;

    #[test]
    fn created_pipe_in_gets_seed_slot() {
        let mut g = Graph::new(GraphId(0));
        g.add_node(Node::pipe_in(NodeId(1)));

        let mut session = PipeSession::new();
        session.on_node_created(&mut g, NodeId(1));

        let node = g.find_node(NodeId(1)).unwrap();
        assert_eq!(node.dynamic_input_indexes().len(), 1);
        assert_eq!(node.inputs[0].name, PLACEHOLDER_NAME);
        assert_eq!(session.pending().len(), 1);
    }

    #[test]
    fn refresh_on_missing_node_errors() {
        let mut g = Graph::new(GraphId(0));
        let mut session = PipeSession::new();
        let err = session.refresh_pipe_in(&mut g, NodeId(42));
        assert!(matches!(err, Err(SyncError::NodeNotFound { .. })));
    }

    #[test]
    fn refresh_on_wrong_class_errors() {
        let mut g = Graph::new(GraphId(0));
        g.add_node(Node::plain(NodeId(1)));
        let mut session = PipeSession::new();
        let err = session.refresh_pipe_in(&mut g, NodeId(1));
        assert!(matches!(err, Err(SyncError::WrongClass { .. })));
    }

    #[test]
    fn stale_pending_task_is_dropped() {
        let mut g = Graph::new(GraphId(0));
        g.add_node(Node::pipe_in(NodeId(1)));

        let mut session = PipeSession::new();
        session.on_node_created(&mut g, NodeId(1));
        g.remove_node(NodeId(1));

        // Must not panic or error: the node is gone.
        session.drain_pending(&mut g);
        assert!(session.pending().is_empty());
    }

    #[test]
    fn removed_node_cancels_task() {
        let mut session = PipeSession::new();
        session.pending.schedule(NodeId(1), TaskKind::RefreshPipeIn);
        session.on_node_removed(NodeId(1));
        assert!(session.pending().is_empty());
    }

    #[test]
    fn update_request_on_plain_node_is_nonfatal() {
        let mut g = Graph::new(GraphId(0));
        g.add_node(Node::plain(NodeId(1)));
        let mut session = PipeSession::new();
        // Logs and returns; nothing to assert beyond "does not panic".
        session.request_update(&mut g, NodeId(1));
        session.request_update(&mut g, NodeId(99));
    }

    #[test]
    fn persisted_schema_carries_timestamp() {
        let mut g = Graph::new(GraphId(0));
        let mut src = Node::plain(NodeId(1));
        src.add_output("a", TypeTag::new("IMAGE"));
        g.add_node(src);
        g.add_node(Node::pipe_in(NodeId(2)));

        let mut session = PipeSession::new();
        session.on_node_created(&mut g, NodeId(2));
        g.connect(NodeId(1), 0, NodeId(2), 0, TypeTag::new("IMAGE")).unwrap();
        session.on_connections_changed(&mut g, NodeId(2));

        let node = g.find_node(NodeId(2)).unwrap();
        assert!(node.schema_timestamp().is_some());
        let schema = node.stored_schema().unwrap();
        assert_eq!(schema.field(0).unwrap().name, "image");
    }
}
