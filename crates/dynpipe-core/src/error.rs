//! Core error types for dynpipe-core.
//!
//! Uses `thiserror` for structured, matchable variants. Only host-facing
//! mutations error; lookups degrade to sentinels instead (a resolution miss
//! is an expected state, not a failure).

use crate::id::NodeId;
use thiserror::Error;

/// Errors produced by graph mutation operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A node id was not found among this graph's direct children.
    #[error("node not found: {id}")]
    NodeNotFound { id: NodeId },

    /// A slot index was out of range for the node.
    #[error("{kind} slot {index} out of range on node {node}")]
    SlotOutOfRange {
        node: NodeId,
        kind: &'static str,
        index: usize,
    },

    /// Attempted to connect into a widget-backed input slot.
    #[error("input slot {index} on node {node} is widget-backed")]
    WidgetSlot { node: NodeId, index: usize },
}
