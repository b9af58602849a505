//! Document store primitives for docgraph.
//!
//! The engine talks to storage only through the [`DocumentStore`] trait. Two
//! backends ship with this crate:
//!
//! - [`MemoryStore`] - in-process maps, for tests and ephemeral data
//! - [`SledStore`] - embedded persistent storage with background index builds
//!
//! Remote document databases plug in by implementing [`DocumentStore`].

pub mod config;
pub mod error;
mod index;
pub mod memory;
pub mod metrics;
pub mod sled_store;
pub mod store;

pub use config::{StorageConfig, DEFAULT_DATABASE};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use metrics::{MetricsSnapshot, StoreMetrics, StoreOp};
pub use sled_store::SledStore;
pub use store::DocumentStore;

/// Re-export of the wire protocol crate.
pub use docgraph_proto as proto;
