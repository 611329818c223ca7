//! Declared type tags for links and slots.
//!
//! Hosts type connections with free-form strings rather than a nominal type
//! system; `"*"`, `"any"` and the empty string all denote the wildcard that
//! accepts every connection. [`TypeTag`] wraps the raw string and centralizes
//! wildcard detection and normalization.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved type tag for the pipe trunk link between `PipeIn` and `PipeOut`.
pub const PIPE_TYPE: &str = "PIPE";

/// A declared link/slot type as carried by the host graph.
///
/// Compared verbatim for identity; use [`normalized`](TypeTag::normalized)
/// before deriving names or matching against the wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTag(String);

impl TypeTag {
    /// Wraps a raw type string.
    pub fn new(raw: impl Into<String>) -> Self {
        TypeTag(raw.into())
    }

    /// The wildcard tag `"*"`.
    pub fn wildcard() -> Self {
        TypeTag("*".to_string())
    }

    /// The reserved pipe trunk tag.
    pub fn pipe() -> Self {
        TypeTag(PIPE_TYPE.to_string())
    }

    /// The raw string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for `"*"`, `"any"` (case-insensitive) and the empty
    /// string -- all of which the host treats as accept-anything.
    pub fn is_wildcard(&self) -> bool {
        let t = self.0.trim();
        t.is_empty() || t == "*" || t.eq_ignore_ascii_case("any")
    }

    /// Returns `true` if this is the reserved pipe trunk tag.
    pub fn is_pipe(&self) -> bool {
        self.0.trim() == PIPE_TYPE
    }

    /// Trims whitespace and strips a trailing comma-separated type-union
    /// suffix (`"IMAGE,MASK"` -> `"IMAGE"`). Wildcard spellings collapse
    /// to `"*"`.
    pub fn normalized(&self) -> TypeTag {
        if self.is_wildcard() {
            return TypeTag::wildcard();
        }
        let trimmed = self.0.trim();
        let head = trimmed.split(',').next().unwrap_or(trimmed).trim();
        if head.is_empty() {
            TypeTag::wildcard()
        } else {
            TypeTag(head.to_string())
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TypeTag {
    fn from(raw: &str) -> Self {
        TypeTag(raw.to_string())
    }
}

impl From<String> for TypeTag {
    fn from(raw: String) -> Self {
        TypeTag(raw)
    }
}
