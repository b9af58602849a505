//! docgraph wire protocol types.
//!
//! This crate defines the shape of the documents the engine writes to a
//! document store.
//!
//! # Modules
//!
//! - [`document`] - Flat key/value documents and reference-key naming
//! - [`join`] - Join relations backing shared reference sequences
//! - [`result`] - Write results reported by a store
//! - [`error`] - Protocol error types

pub mod document;
pub mod error;
pub mod join;
pub mod result;

pub use document::{list_key, single_key, Document, ID_KEY};
pub use error::Error;
pub use join::{join_collection, JoinRow, CHILD_KEY, PARENT_KEY, POSITION_KEY};
pub use result::WriteResult;

/// Re-export of the JSON value type documents are built from.
pub use serde_json::Value;
