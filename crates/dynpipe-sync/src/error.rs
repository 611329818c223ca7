//! Error types for host-facing refresh entry points.
//!
//! The engine itself degrades to sentinels on resolution misses; these
//! variants only surface at the interactive refresh seam, where the host
//! catches them, logs non-fatally, and leaves prior state intact.

use dynpipe_core::id::NodeId;
use dynpipe_core::node::NodeClass;
use thiserror::Error;

/// Errors produced by explicit refresh requests.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The node id was not found in any reachable graph scope.
    #[error("node not found: {id}")]
    NodeNotFound { id: NodeId },

    /// The node exists but is not the expected pipe node class.
    #[error("node {id} is {found}, expected {expected}")]
    WrongClass {
        id: NodeId,
        expected: NodeClass,
        found: NodeClass,
    },
}
