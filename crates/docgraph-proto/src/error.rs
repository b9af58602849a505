//! Protocol error types.

use thiserror::Error;

/// Protocol-level errors raised while reading wire documents.
#[derive(Debug, Error)]
pub enum Error {
    /// A key expected to hold an identity holds something else.
    #[error("invalid identity under `{key}`: {value}")]
    InvalidId { key: String, value: String },

    /// A key expected to hold an identity list holds something else.
    #[error("invalid identity list under `{key}`")]
    InvalidIdList { key: String },

    /// A required key is absent from the document.
    #[error("missing key `{0}`")]
    MissingKey(String),

    /// Serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}
