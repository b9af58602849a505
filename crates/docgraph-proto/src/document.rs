//! Flat key/value wire documents.
//!
//! Every persisted entity is written as one flat JSON object:
//!
//! - scalar fields map 1:1 by field name,
//! - an owned single reference is written as `<field>_id`,
//! - an owned reference sequence is written as `<field>_list`,
//! - the identity lives under the reserved [`ID_KEY`] and is only present once
//!   assigned.
//!
//! Shared sequences contribute nothing to the parent document; they live in a
//! join relation (see [`crate::join`]).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::Error;

/// Reserved key holding a document's identity.
pub const ID_KEY: &str = "id";

/// Suffix of the key holding an owned single reference.
pub const SINGLE_SUFFIX: &str = "_id";

/// Suffix of the key holding an owned reference sequence.
pub const LIST_SUFFIX: &str = "_list";

/// Key under which an owned single reference named `field` is written.
pub fn single_key(field: &str) -> String {
    format!("{}{}", field, SINGLE_SUFFIX)
}

/// Key under which an owned reference sequence named `field` is written.
pub fn list_key(field: &str) -> String {
    format!("{}{}", field, LIST_SUFFIX)
}

/// A flat wire document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Document identity, if one has been assigned.
    pub fn id(&self) -> Result<Option<Uuid>, Error> {
        self.uuid(ID_KEY)
    }

    /// Set the document identity.
    pub fn set_id(&mut self, id: Uuid) {
        self.0.insert(ID_KEY.to_string(), Value::String(id.to_string()));
    }

    /// Set the identity only when the document does not carry one yet.
    ///
    /// Returns the identity the document ends up with.
    pub fn ensure_id(&mut self, generate: impl FnOnce() -> Uuid) -> Result<(Uuid, bool), Error> {
        match self.id()? {
            Some(id) => Ok((id, false)),
            None => {
                let id = generate();
                self.set_id(id);
                Ok((id, true))
            }
        }
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Insert a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a value by key.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Check whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the document has no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over key/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Read a key as an identity. `null` and absent keys read as `None`.
    pub fn uuid(&self, key: &str) -> Result<Option<Uuid>, Error> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => parse_uuid(key, value).map(Some),
        }
    }

    /// Read a key as an ordered identity list. An absent key reads as empty.
    pub fn uuid_list(&self, key: &str) -> Result<Vec<Uuid>, Error> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items.iter().map(|v| parse_uuid(key, v)).collect(),
            Some(_) => Err(Error::InvalidIdList {
                key: key.to_string(),
            }),
        }
    }

    /// Write an ordered identity list under `key`.
    pub fn set_uuid_list(&mut self, key: impl Into<String>, ids: &[Uuid]) {
        let items = ids.iter().map(|id| Value::String(id.to_string())).collect();
        self.0.insert(key.into(), Value::Array(items));
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying map.
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Encode as JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(&self.0).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Decode from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(bytes)
            .map(Self)
            .map_err(|e| Error::Serialization(e.to_string()))
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn parse_uuid(key: &str, value: &Value) -> Result<Uuid, Error> {
    value
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| Error::InvalidId {
            key: key.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reference_keys() {
        assert_eq!(single_key("author"), "author_id");
        assert_eq!(list_key("chapters"), "chapters_list");
    }

    #[test]
    fn test_identity_absent_until_set() {
        let mut doc = Document::new();
        assert_eq!(doc.id().unwrap(), None);

        let id = Uuid::new_v4();
        doc.set_id(id);
        assert_eq!(doc.id().unwrap(), Some(id));
        assert_eq!(doc.get(ID_KEY), Some(&json!(id.to_string())));
    }

    #[test]
    fn test_ensure_id_keeps_existing() {
        let existing = Uuid::new_v4();
        let mut doc = Document::new();
        doc.set_id(existing);

        let (id, generated) = doc.ensure_id(Uuid::new_v4).unwrap();
        assert_eq!(id, existing);
        assert!(!generated);
    }

    #[test]
    fn test_uuid_list_preserves_order() {
        let ids = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let mut doc = Document::new();
        doc.set_uuid_list("chapters_list", &ids);

        assert_eq!(doc.uuid_list("chapters_list").unwrap(), ids);
        assert!(doc.uuid_list("missing_list").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_identity() {
        let mut doc = Document::new();
        doc.insert("author_id", 42);
        assert!(matches!(doc.uuid("author_id"), Err(Error::InvalidId { .. })));

        doc.insert("tags_list", "nope");
        assert!(matches!(
            doc.uuid_list("tags_list"),
            Err(Error::InvalidIdList { .. })
        ));
    }

    #[test]
    fn test_bytes_roundtrip() {
        let mut doc = Document::new();
        doc.set_id(Uuid::new_v4());
        doc.insert("title", "Dune");
        doc.insert("pages", 412);

        let decoded = Document::from_bytes(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, doc);
    }
}
