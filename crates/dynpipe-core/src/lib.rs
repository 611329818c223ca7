pub mod error;
pub mod graph;
pub mod id;
pub mod link;
pub mod node;
pub mod props;
pub mod schema;
pub mod slot;
pub mod types;

// Re-export commonly used types
pub use error::CoreError;
pub use graph::Graph;
pub use id::{GraphId, LinkId, NodeId};
pub use link::Link;
pub use node::{Node, NodeClass, Widget};
pub use props::PropertyBag;
pub use schema::{Schema, SchemaField};
pub use slot::{InputSlot, OutputSlot};
pub use types::TypeTag;
