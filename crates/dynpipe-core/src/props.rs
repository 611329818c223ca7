//! Free-form per-node property bag.
//!
//! Round-trips through host document save/load as JSON. The dynamic pipe
//! logic persists its schema, a timestamp, and the `PipeOut` back-reference
//! here; everything else in the bag belongs to the host and is left alone.
//! Uses [`IndexMap`] so serialized property order is stable.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Property key: persisted schema (ordered list of `{name, type}`).
pub const PROP_SCHEMA: &str = "pipe_schema";

/// Property key: Unix-millisecond timestamp of the last schema computation.
pub const PROP_SCHEMA_TS: &str = "pipe_schema_ts";

/// Property key: on a `PipeOut`, the id of the producing `PipeIn`.
pub const PROP_SOURCE_NODE: &str = "pipe_source_node_id";

/// Property key: fallback location for the user-supplied pipe name.
pub const PROP_PIPE_NAME: &str = "pipe_name";

/// An insertion-ordered string-to-JSON property map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag {
    entries: IndexMap<String, Value>,
}

impl PropertyBag {
    pub fn new() -> Self {
        PropertyBag::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    /// String-typed lookup; non-string values yield `None`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    /// Unsigned-integer lookup; non-numeric values yield `None`.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.entries.get(key).and_then(Value::as_u64)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
