//! Graph nodes: classification, slots, widgets, properties, nested subgraphs.
//!
//! Node classification is resolved once at construction and carried as a
//! typed tag ([`NodeClass`]) rather than re-derived from ad hoc properties on
//! every event. A node may own a nested [`Graph`], which introduces a new
//! link-id scope; the subgraph's lifetime ends with the node.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;

use crate::graph::Graph;
use crate::id::NodeId;
use crate::props::{PropertyBag, PROP_PIPE_NAME, PROP_SCHEMA, PROP_SCHEMA_TS, PROP_SOURCE_NODE};
use crate::schema::Schema;
use crate::slot::{InputSlot, OutputSlot, DEFAULT_OUTPUT_NAME, PIPE_INPUT_NAME};
use crate::types::TypeTag;

/// Widget name carrying the user-supplied pipe name.
pub const PIPE_NAME_WIDGET: &str = "pipe_name";

/// Capability tag assigned at node-type registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeClass {
    /// Aggregates N typed connections into one named schema.
    PipeIn,
    /// Re-exposes a received schema as individual outputs.
    PipeOut,
    /// Forwards its single input to its single output (reroute).
    Passthrough,
    /// Any other host node.
    Plain,
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeClass::PipeIn => "pipe-in",
            NodeClass::PipeOut => "pipe-out",
            NodeClass::Passthrough => "passthrough",
            NodeClass::Plain => "plain",
        };
        write!(f, "{name}")
    }
}

/// A host widget attached to a node (e.g. the `pipe_name` text box).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Widget {
    pub name: String,
    pub value: Value,
}

/// A node in a host graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub class: NodeClass,
    pub title: String,
    pub inputs: SmallVec<[InputSlot; 4]>,
    pub outputs: SmallVec<[OutputSlot; 2]>,
    pub widgets: Vec<Widget>,
    pub properties: PropertyBag,
    /// Nested graph owned by this node, if it is a subgraph container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgraph: Option<Box<Graph>>,
    /// Host redraw signal, consumed and cleared by the canvas.
    #[serde(skip)]
    pub canvas_dirty: bool,
    /// Host size-recompute signal, consumed and cleared by the canvas.
    #[serde(skip)]
    pub needs_resize: bool,
}

impl Node {
    /// Creates a bare node of the given class with no slots.
    pub fn new(id: NodeId, class: NodeClass) -> Self {
        Node {
            id,
            class,
            title: class.to_string(),
            inputs: SmallVec::new(),
            outputs: SmallVec::new(),
            widgets: Vec::new(),
            properties: PropertyBag::new(),
            subgraph: None,
            canvas_dirty: false,
            needs_resize: false,
        }
    }

    /// Creates a `PipeIn` as node-type registration would: a `pipe_name`
    /// widget and the pipe trunk output. The seed dynamic input is added by
    /// the first normalization pass.
    pub fn pipe_in(id: NodeId) -> Self {
        let mut node = Node::new(id, NodeClass::PipeIn);
        node.widgets.push(Widget {
            name: PIPE_NAME_WIDGET.to_string(),
            value: Value::String(String::new()),
        });
        node.add_output(PIPE_INPUT_NAME, TypeTag::pipe());
        node
    }

    /// Creates a `PipeOut` as node-type registration would: a `pipe_name`
    /// widget, the pipe trunk input, and the single default output.
    pub fn pipe_out(id: NodeId) -> Self {
        let mut node = Node::new(id, NodeClass::PipeOut);
        node.widgets.push(Widget {
            name: PIPE_NAME_WIDGET.to_string(),
            value: Value::String(String::new()),
        });
        node.add_input(PIPE_INPUT_NAME, TypeTag::pipe());
        node.add_output(DEFAULT_OUTPUT_NAME, TypeTag::wildcard());
        node
    }

    /// Creates a one-in/one-out wildcard reroute node.
    pub fn passthrough(id: NodeId) -> Self {
        let mut node = Node::new(id, NodeClass::Passthrough);
        node.add_input("in", TypeTag::wildcard());
        node.add_output("out", TypeTag::wildcard());
        node
    }

    /// Creates a plain host node with no slots.
    pub fn plain(id: NodeId) -> Self {
        Node::new(id, NodeClass::Plain)
    }

    /// Wraps a nested graph into this node (builder style).
    pub fn with_subgraph(mut self, graph: Graph) -> Self {
        self.subgraph = Some(Box::new(graph));
        self
    }

    // -----------------------------------------------------------------------
    // Slot operations
    // -----------------------------------------------------------------------

    /// Appends an input slot, returning its index.
    pub fn add_input(&mut self, name: impl Into<String>, ty: TypeTag) -> usize {
        self.inputs.push(InputSlot::new(name, ty));
        self.inputs.len() - 1
    }

    /// Appends a widget-backed input slot, returning its index.
    pub fn add_widget_input(&mut self, name: impl Into<String>, widget: impl Into<String>) -> usize {
        self.inputs.push(InputSlot::widget_backed(name, widget));
        self.inputs.len() - 1
    }

    /// Appends an output slot, returning its index.
    pub fn add_output(&mut self, name: impl Into<String>, ty: TypeTag) -> usize {
        self.outputs.push(OutputSlot::new(name, ty));
        self.outputs.len() - 1
    }

    /// Removes an input slot. Out-of-range indices are a no-op (`None`),
    /// matching the guarded host-call policy. Link target indices referencing
    /// later slots go stale; callers repair them via
    /// [`Graph::reindex_links_for`].
    pub fn remove_input(&mut self, index: usize) -> Option<InputSlot> {
        if index < self.inputs.len() {
            Some(self.inputs.remove(index))
        } else {
            None
        }
    }

    /// Removes an output slot. Out-of-range indices are a no-op (`None`).
    pub fn remove_output(&mut self, index: usize) -> Option<OutputSlot> {
        if index < self.outputs.len() {
            Some(self.outputs.remove(index))
        } else {
            None
        }
    }

    /// Indices of the non-widget ("dynamic") input slots, in slot order.
    pub fn dynamic_input_indexes(&self) -> Vec<usize> {
        self.inputs
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.is_widget())
            .map(|(i, _)| i)
            .collect()
    }

    /// Index of the highest currently-connected output, if any.
    pub fn highest_connected_output(&self) -> Option<usize> {
        self.outputs.iter().rposition(OutputSlot::is_connected)
    }

    /// The input slot receiving the pipe trunk: the one named `"pipe"`, else
    /// the first non-widget input.
    pub fn pipe_input_index(&self) -> Option<usize> {
        self.inputs
            .iter()
            .position(|slot| slot.name == PIPE_INPUT_NAME)
            .or_else(|| self.inputs.iter().position(|slot| !slot.is_widget()))
    }

    // -----------------------------------------------------------------------
    // Widgets and pipe identity
    // -----------------------------------------------------------------------

    /// Looks up a widget by name.
    pub fn widget(&self, name: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.name == name)
    }

    /// The user-supplied pipe name: widget value first, property bag second,
    /// trimmed; empty means unnamed.
    pub fn pipe_name(&self) -> Option<String> {
        let from_widget = self
            .widget(PIPE_NAME_WIDGET)
            .and_then(|w| w.value.as_str())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(name) = from_widget {
            return Some(name.to_string());
        }
        self.properties
            .get_str(PROP_PIPE_NAME)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Sets the pipe name on the widget when present, else in the property
    /// bag (older documents carry it there).
    pub fn set_pipe_name(&mut self, name: &str) {
        if let Some(widget) = self.widgets.iter_mut().find(|w| w.name == PIPE_NAME_WIDGET) {
            widget.value = Value::String(name.to_string());
        } else {
            self.properties
                .set(PROP_PIPE_NAME, Value::String(name.to_string()));
        }
    }

    // -----------------------------------------------------------------------
    // Schema persistence (round-trips through the property bag)
    // -----------------------------------------------------------------------

    /// Reads the persisted schema, tolerating malformed stored values.
    pub fn stored_schema(&self) -> Option<Schema> {
        self.properties.get(PROP_SCHEMA).map(Schema::from_value)
    }

    /// Persists a schema and its computation timestamp (Unix milliseconds).
    pub fn store_schema(&mut self, schema: &Schema, timestamp: u64) {
        // Serializing a Schema cannot fail; fall back to an empty list if it
        // somehow does rather than poisoning the property bag.
        let value = serde_json::to_value(schema).unwrap_or_else(|_| Value::Array(Vec::new()));
        self.properties.set(PROP_SCHEMA, value);
        self.properties
            .set(PROP_SCHEMA_TS, Value::from(timestamp));
    }

    /// Timestamp of the last persisted schema, if any.
    pub fn schema_timestamp(&self) -> Option<u64> {
        self.properties.get_u64(PROP_SCHEMA_TS)
    }

    /// On a `PipeOut`: the id of the producing `PipeIn`, if recorded.
    pub fn source_node_id(&self) -> Option<NodeId> {
        self.properties.get_u64(PROP_SOURCE_NODE).map(NodeId)
    }

    /// Records the producing `PipeIn`'s id on this node.
    pub fn set_source_node_id(&mut self, id: NodeId) {
        self.properties.set(PROP_SOURCE_NODE, Value::from(id.0));
    }

    // -----------------------------------------------------------------------
    // Host render signals
    // -----------------------------------------------------------------------

    /// Flags the node for redraw.
    pub fn mark_dirty(&mut self) {
        self.canvas_dirty = true;
    }

    /// Flags the node for size recomputation.
    pub fn request_resize(&mut self) {
        self.needs_resize = true;
    }

    /// Clears both render flags; the host calls this after consuming them.
    pub fn clear_render_flags(&mut self) {
        self.canvas_dirty = false;
        self.needs_resize = false;
    }
}
