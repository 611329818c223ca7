//! Schema inference from a `PipeIn`'s connected inputs.
//!
//! Field names must be syntactically valid identifiers for the consuming
//! backend, unique within one schema, and deterministic for a fixed
//! connection state so that re-running inference is idempotent.

use std::collections::HashMap;

use dynpipe_core::node::Node;
use dynpipe_core::schema::Schema;

use crate::scope::ScopeIndex;

/// Derives an identifier-safe base name from a declared type string.
///
/// Trim + lowercase; wildcard/empty collapse to `any`; runs of
/// non-alphanumeric characters become a single `_` (leading/trailing `_`
/// dropped); a leading digit gains a `t_` prefix.
pub fn sanitize_base_name(raw: &str) -> String {
    let lowered = raw.trim().to_ascii_lowercase();
    if lowered.is_empty() || lowered == "*" || lowered == "any" {
        return "any".to_string();
    }

    let mut base = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        if ch.is_ascii_alphanumeric() {
            base.push(ch);
        } else if !base.is_empty() && !base.ends_with('_') {
            base.push('_');
        }
    }
    while base.ends_with('_') {
        base.pop();
    }

    if base.is_empty() {
        "any".to_string()
    } else if base.starts_with(|c: char| c.is_ascii_digit()) {
        format!("t_{base}")
    } else {
        base
    }
}

/// Infers the schema from a `PipeIn`'s currently connected dynamic inputs,
/// in slot order. Unconnected slots are skipped; link types resolve through
/// the multi-scope index (miss -> wildcard). Repeated base names gain `_2`,
/// `_3`, ... suffixes in order of encounter. Zero connected inputs yield an
/// empty schema.
///
/// The stored field type is the raw resolved link type; sanitization only
/// feeds the name.
pub fn infer_schema(node: &Node, scope: &ScopeIndex<'_>) -> Schema {
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut schema = Schema::new();

    for index in node.dynamic_input_indexes() {
        let slot = &node.inputs[index];
        if slot.link.is_none() {
            continue;
        }
        let ty = scope.link_type(slot.link);
        let base = sanitize_base_name(ty.normalized().as_str());
        let count = counters.entry(base.clone()).or_insert(0);
        *count += 1;
        let name = if *count == 1 {
            base
        } else {
            format!("{base}_{count}")
        };
        schema.push(name, ty);
    }
    schema
}
