//! Engine error types.

use thiserror::Error;
use uuid::Uuid;

use docgraph_store::StoreError;

/// Engine errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The document store failed. Connectivity failures land here unmodified.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A stored document is malformed.
    #[error("protocol error: {0}")]
    Protocol(#[from] docgraph_proto::Error),

    /// The store rejected an upsert.
    #[error("write to `{collection}` rejected ({errors} error(s)): {message}")]
    WriteConflict {
        collection: String,
        errors: u64,
        message: String,
    },

    /// No document with this identity.
    #[error("no document `{id}` in `{collection}`")]
    NotFound { collection: String, id: Uuid },

    /// A stored value could not be converted into its field type.
    #[error("cannot convert `{collection}.{field}`: {reason}")]
    Conversion {
        collection: String,
        field: String,
        reason: String,
    },

    /// An entity description was rejected at registration.
    #[error("invalid model for `{entity}`: {reason}")]
    InvalidModel { entity: String, reason: String },

    /// The store neither accepted a supplied identity nor generated one.
    #[error("store generated no identity for a write to `{collection}`")]
    MissingGeneratedKey { collection: String },

    /// The blocking facade could not start its runtime.
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check whether this error reports a missing document.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub(crate) fn invalid_model(entity: &str, reason: impl Into<String>) -> Self {
        Error::InvalidModel {
            entity: entity.to_string(),
            reason: reason.into(),
        }
    }
}
