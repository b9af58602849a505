//! Store error types.

use thiserror::Error;

/// Errors raised by a document store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// Embedded storage failure.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// A stored document could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] docgraph_proto::Error),

    /// The collection does not exist.
    #[error("collection `{0}` does not exist")]
    CollectionNotFound(String),

    /// The collection already exists.
    #[error("collection `{0}` already exists")]
    CollectionExists(String),

    /// The index does not exist.
    #[error("index `{index}` does not exist on `{collection}`")]
    IndexNotFound { collection: String, index: String },

    /// The index already exists.
    #[error("index `{index}` already exists on `{collection}`")]
    IndexExists { collection: String, index: String },

    /// A background index build did not complete.
    #[error("index `{index}` on `{collection}` failed to build: {reason}")]
    IndexBuild {
        collection: String,
        index: String,
        reason: String,
    },
}

impl StoreError {
    /// Check whether this error reports a redundant creation.
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            StoreError::CollectionExists(_) | StoreError::IndexExists { .. }
        )
    }
}
