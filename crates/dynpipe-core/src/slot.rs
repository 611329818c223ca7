//! Input and output slots.
//!
//! An input slot holds at most one link; an output slot fans out to many.
//! Widget-backed input slots belong to the host's widget machinery and are
//! invisible to the synchronizer. Unconnected dynamic inputs display the
//! sentinel placeholder name `"optional"`.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::id::LinkId;
use crate::types::TypeTag;

/// Display name for an unconnected dynamic input slot.
pub const PLACEHOLDER_NAME: &str = "optional";

/// Display name of a `PipeOut`'s single default output.
pub const DEFAULT_OUTPUT_NAME: &str = "out_1";

/// Name of the `PipeOut` input that receives the pipe trunk link.
pub const PIPE_INPUT_NAME: &str = "pipe";

/// Name for a connected output beyond the schema range (1-based position).
/// Surfaced, not hidden, so the user notices the stale connection.
pub fn orphan_name(position: usize) -> String {
    format!("orphan_{position}")
}

/// Name for an unconnected, hidden output beyond the schema range.
pub fn unused_name(position: usize) -> String {
    format!("unused_{position}")
}

/// An input slot: at most one incoming link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSlot {
    /// Display name shown by the host.
    pub name: String,
    /// Declared type tag. Dynamic pipe inputs are forced to wildcard so the
    /// host accepts any connection; typing lives in the name/schema instead.
    pub ty: TypeTag,
    /// The incoming link, if connected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkId>,
    /// Name of the host widget bound to this slot, if any. Widget-backed
    /// slots are never touched by slot synchronization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget: Option<String>,
    /// Host render-state flag, cleared whenever the slot is renamed.
    #[serde(default)]
    pub hidden: bool,
}

impl InputSlot {
    /// Creates a visible, unconnected input slot.
    pub fn new(name: impl Into<String>, ty: TypeTag) -> Self {
        InputSlot {
            name: name.into(),
            ty,
            link: None,
            widget: None,
            hidden: false,
        }
    }

    /// Creates the unconnected `"optional"` placeholder slot.
    pub fn placeholder() -> Self {
        InputSlot::new(PLACEHOLDER_NAME, TypeTag::wildcard())
    }

    /// Creates a widget-backed input slot.
    pub fn widget_backed(name: impl Into<String>, widget: impl Into<String>) -> Self {
        let name = name.into();
        InputSlot {
            widget: Some(widget.into()),
            ..InputSlot::new(name, TypeTag::wildcard())
        }
    }

    /// Returns `true` if an incoming link is attached.
    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Returns `true` if this slot belongs to a host widget.
    pub fn is_widget(&self) -> bool {
        self.widget.is_some()
    }

    /// Renames the slot and clears stale render state.
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        self.hidden = false;
    }
}

/// An output slot: fan-out to zero or more destination links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSlot {
    /// Display name shown by the host.
    pub name: String,
    /// Declared type tag.
    pub ty: TypeTag,
    /// Outgoing links, in connection order.
    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub links: SmallVec<[LinkId; 2]>,
    /// Host render-state flag. Unused beyond-schema outputs are hidden.
    #[serde(default)]
    pub hidden: bool,
}

impl OutputSlot {
    /// Creates a visible output slot with no connections.
    pub fn new(name: impl Into<String>, ty: TypeTag) -> Self {
        OutputSlot {
            name: name.into(),
            ty,
            links: SmallVec::new(),
            hidden: false,
        }
    }

    /// Returns `true` if at least one destination is attached.
    pub fn is_connected(&self) -> bool {
        !self.links.is_empty()
    }

    /// Renames the slot and clears stale render state.
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        self.hidden = false;
    }
}
