//! Slot-list synchronization.
//!
//! `PipeIn` inputs grow and shrink with user connections: connected slots
//! take their names from the schema, unconnected slots show the `"optional"`
//! placeholder, and exactly one open slot is kept at the tail. `PipeOut`
//! outputs are a pure projection of an externally supplied schema onto the
//! current connection state, with orphan-surfacing as the safety net when
//! the producer's schema shrinks.
//!
//! Neither routine ever removes a slot holding a live connection, and both
//! leave widget-backed slots untouched. Callers that mutate slot positions
//! must repair recorded link indices afterwards via
//! [`Graph::reindex_links_for`](dynpipe_core::graph::Graph::reindex_links_for).

use dynpipe_core::node::Node;
use dynpipe_core::schema::Schema;
use dynpipe_core::slot::{self, InputSlot, DEFAULT_OUTPUT_NAME, PLACEHOLDER_NAME};
use dynpipe_core::types::TypeTag;

/// Guarantees at least one dynamic input slot exists (a fresh `PipeIn` has
/// none until its first normalization pass).
fn ensure_seed_input(node: &mut Node) {
    if node.dynamic_input_indexes().is_empty() {
        node.inputs.push(InputSlot::placeholder());
    }
}

/// Synchronizes a `PipeIn`'s dynamic inputs against a schema.
///
/// Invariants enforced on return:
/// - connected slots are named from schema entries consumed in slot order;
///   entries past the schema keep their current names (the no-schema
///   normalization pass relies on this);
/// - unconnected slots show the `"optional"` placeholder;
/// - exactly one unconnected dynamic slot sits at the tail -- redundant tail
///   placeholders collapse from the end, interior placeholders survive;
/// - no connected slot is removed;
/// - every dynamic slot's declared type is forced to wildcard.
pub fn sync_pipe_in_inputs(node: &mut Node, schema: &Schema) {
    ensure_seed_input(node);

    // Collapse redundant unconnected tail placeholders, scanning from the end.
    let mut dynamic = node.dynamic_input_indexes();
    while dynamic.len() >= 2 {
        let last = dynamic[dynamic.len() - 1];
        let prev = dynamic[dynamic.len() - 2];
        if node.inputs[last].is_connected() || node.inputs[prev].is_connected() {
            break;
        }
        node.remove_input(last);
        dynamic.pop();
    }

    // The tail must stay open: a connected last slot spawns a new placeholder.
    let tail_connected = dynamic
        .last()
        .map_or(true, |&i| node.inputs[i].is_connected());
    if tail_connected {
        node.inputs.push(InputSlot::placeholder());
    }

    // Naming pass: schema entries are consumed one per connected slot.
    let mut next_field = 0;
    for index in node.dynamic_input_indexes() {
        let connected = node.inputs[index].is_connected();
        let slot = &mut node.inputs[index];
        if connected {
            if let Some(field) = schema.field(next_field) {
                slot.set_name(&field.name);
            }
            next_field += 1;
        } else {
            slot.set_name(PLACEHOLDER_NAME);
        }
        slot.ty = TypeTag::wildcard();
    }

    node.request_resize();
    node.mark_dirty();
}

/// Post-deserialization normalization for a `PipeIn`.
///
/// Host deserialization may reintroduce stale placeholder slots; the
/// observed artifact is a spurious leading placeholder after the node was
/// moved into a nested scope. That slot is removed iff some later dynamic
/// slot is connected, then the regular no-schema sync applies (persisted
/// names on connected slots are preserved).
pub fn normalize_after_load(node: &mut Node) {
    let dynamic = node.dynamic_input_indexes();
    if let Some((&first, rest)) = dynamic.split_first() {
        let later_connected = rest.iter().any(|&i| node.inputs[i].is_connected());
        if later_connected && !node.inputs[first].is_connected() {
            node.remove_input(first);
        }
    }
    sync_pipe_in_inputs(node, &Schema::new());
}

/// Synchronizes a `PipeOut`'s outputs against a pushed schema.
///
/// The slot count becomes `max(schema.len(), 1 + highest connected index, 1)`:
/// never fewer than the schema exposes, never few enough to drop a live
/// connection, never zero. Outputs beyond the schema range are surfaced as
/// `orphan_<pos>` when connected, or hidden as `unused_<pos>` and trimmed
/// from the tail inward when not.
pub fn sync_pipe_out_outputs(node: &mut Node, schema: &Schema) {
    let highest = node.highest_connected_output();
    let desired = schema
        .len()
        .max(highest.map_or(0, |i| i + 1))
        .max(1);

    while node.outputs.len() < desired {
        node.add_output("unused", TypeTag::wildcard());
    }

    for index in 0..desired {
        let connected = node.outputs[index].is_connected();
        let out = &mut node.outputs[index];
        match schema.field(index) {
            Some(field) => {
                out.set_name(&field.name);
                out.ty = field.ty.clone();
            }
            None if index == 0 && schema.is_empty() => {
                out.set_name(DEFAULT_OUTPUT_NAME);
                out.ty = TypeTag::wildcard();
            }
            None if connected => {
                out.set_name(&slot::orphan_name(index + 1));
                out.ty = TypeTag::wildcard();
            }
            None => {
                out.name = slot::unused_name(index + 1);
                out.ty = TypeTag::wildcard();
                out.hidden = true;
            }
        }
    }

    // Trim unconnected outputs from the tail inward, stopping at the schema
    // range or the first live connection.
    let floor = schema.len().max(1);
    while node.outputs.len() > floor {
        let last = node.outputs.len() - 1;
        if node.outputs[last].is_connected() {
            break;
        }
        node.remove_output(last);
    }

    node.request_resize();
    node.mark_dirty();
}

/// Resets a `PipeOut` with no resolvable producer to its minimal default: a
/// single wildcard `"out_1"` output, every other unconnected output dropped.
/// A freshly created node must not present a large placeholder surface;
/// connected extras survive as orphans.
pub fn reset_pipe_out_default(node: &mut Node) {
    if node.outputs.is_empty() {
        node.add_output(DEFAULT_OUTPUT_NAME, TypeTag::wildcard());
    }

    let mut index = node.outputs.len();
    while index > 1 {
        index -= 1;
        if !node.outputs[index].is_connected() {
            node.remove_output(index);
        }
    }

    let first = &mut node.outputs[0];
    first.set_name(DEFAULT_OUTPUT_NAME);
    first.ty = TypeTag::wildcard();

    for index in 1..node.outputs.len() {
        let out = &mut node.outputs[index];
        out.set_name(&slot::orphan_name(index + 1));
        out.ty = TypeTag::wildcard();
    }

    node.request_resize();
    node.mark_dirty();
}
