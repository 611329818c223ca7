//! Schema synchronization for dynamic pipe nodes.
//!
//! Layers the inference/synchronization/propagation logic on top of the
//! `dynpipe-core` data model:
//! - [`scope`]: multi-scope traversal index over nested graphs.
//! - [`infer`]: schema inference from a `PipeIn`'s connected inputs.
//! - [`sync`]: slot-list synchronization for both node kinds.
//! - [`resolve`]: producer/consumer resolution strategies.
//! - [`registry`]: the rebuilt-on-demand schema-by-name store.
//! - [`tasks`]: the node-keyed deferred settle queue.
//! - [`session`]: the propagation protocol and host lifecycle entry points.

pub mod error;
pub mod infer;
pub mod registry;
pub mod resolve;
pub mod scope;
pub mod session;
pub mod sync;
pub mod tasks;

// Re-export commonly used types
pub use error::SyncError;
pub use registry::SchemaRegistry;
pub use scope::ScopeIndex;
pub use session::PipeSession;
pub use tasks::{PendingQueue, PendingTask, TaskKind};
