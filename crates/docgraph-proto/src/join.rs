//! Join relations backing shared reference sequences.
//!
//! A shared sequence from `Parent` to `Child` is recorded in the collection
//! `Parent_Child`, one row per element:
//!
//! ```text
//! { "id": <row id>, "parent_id": <parent>, "child_id": <child>, "position": <n> }
//! ```
//!
//! The relation is indexed on both key sides.

use serde_json::Value;
use uuid::Uuid;

use crate::document::{Document, ID_KEY};
use crate::error::Error;

/// Key holding the parent identity of a join row.
pub const PARENT_KEY: &str = "parent_id";

/// Key holding the child identity of a join row.
pub const CHILD_KEY: &str = "child_id";

/// Key holding the element position of a join row within its sequence.
pub const POSITION_KEY: &str = "position";

/// Name of the join relation between two collections.
pub fn join_collection(parent: &str, child: &str) -> String {
    format!("{}_{}", parent, child)
}

/// One row of a join relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinRow {
    /// Row identity. `None` until the store assigns one.
    pub id: Option<Uuid>,
    /// Parent entity identity.
    pub parent_id: Uuid,
    /// Child entity identity.
    pub child_id: Uuid,
    /// Position of the child within the parent's sequence.
    pub position: Option<u64>,
}

impl JoinRow {
    /// Create a row that has not been written yet.
    pub fn new(parent_id: Uuid, child_id: Uuid) -> Self {
        Self {
            id: None,
            parent_id,
            child_id,
            position: None,
        }
    }

    /// Reuse an existing row identity.
    pub fn with_id(mut self, id: Option<Uuid>) -> Self {
        self.id = id;
        self
    }

    /// Set the element position.
    pub fn with_position(mut self, position: u64) -> Self {
        self.position = Some(position);
        self
    }

    /// Encode as a wire document. The identity key is omitted when unassigned.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        if let Some(id) = self.id {
            doc.set_id(id);
        }
        doc.insert(PARENT_KEY, self.parent_id.to_string());
        doc.insert(CHILD_KEY, self.child_id.to_string());
        if let Some(position) = self.position {
            doc.insert(POSITION_KEY, position);
        }
        doc
    }

    /// Decode a stored row.
    pub fn from_document(doc: &Document) -> Result<Self, Error> {
        let parent_id = doc
            .uuid(PARENT_KEY)?
            .ok_or_else(|| Error::MissingKey(PARENT_KEY.to_string()))?;
        let child_id = doc
            .uuid(CHILD_KEY)?
            .ok_or_else(|| Error::MissingKey(CHILD_KEY.to_string()))?;

        Ok(Self {
            id: doc.uuid(ID_KEY)?,
            parent_id,
            child_id,
            position: doc.get(POSITION_KEY).and_then(Value::as_u64),
        })
    }
}

/// Order rows by position. Rows without a position keep their relative order
/// and sort after positioned ones.
pub fn sort_by_position(rows: &mut [JoinRow]) {
    rows.sort_by_key(|row| row.position.unwrap_or(u64::MAX));
}
