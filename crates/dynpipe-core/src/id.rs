//! Stable ID newtypes for graph entities.
//!
//! All IDs are distinct newtype wrappers over `u64`, providing type safety
//! so that a `NodeId` cannot be accidentally used where a `LinkId` is
//! expected. Node IDs are unique across the union of all reachable graphs;
//! link IDs are only unique within the graph scope that allocated them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable node identifier, unique across all reachable graph scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Link identifier, unique within the graph scope that created the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub u64);

/// Graph scope identifier, used for revisit protection during traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphId(pub u64);

// Display implementations -- just print the inner value.

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
