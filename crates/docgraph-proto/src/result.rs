//! Write results reported by a document store.

use uuid::Uuid;

/// Outcome of an upsert.
///
/// Mirrors what document stores report for an insert-with-conflict-replace:
/// per-outcome counters, the keys generated for documents written without an
/// identity, and the first error when any write failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteResult {
    /// Documents inserted.
    pub inserted: u64,
    /// Documents replaced.
    pub replaced: u64,
    /// Writes that failed.
    pub errors: u64,
    /// Identities generated by the store, in write order.
    pub generated_keys: Vec<Uuid>,
    /// Message of the first failed write.
    pub first_error: Option<String>,
}

impl WriteResult {
    /// Result of inserting a document.
    pub fn inserted(generated: Option<Uuid>) -> Self {
        Self {
            inserted: 1,
            generated_keys: generated.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Result of replacing an existing document.
    pub fn replaced() -> Self {
        Self {
            replaced: 1,
            ..Default::default()
        }
    }

    /// Result of a rejected write.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            errors: 1,
            first_error: Some(message.into()),
            ..Default::default()
        }
    }

    /// Check whether any write failed.
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    /// First generated identity, if any.
    pub fn generated_key(&self) -> Option<Uuid> {
        self.generated_keys.first().copied()
    }
}
