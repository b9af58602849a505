//! Secondary index layout for the sled backend.
//!
//! One tree per indexed field. Each entry maps a field value and a document
//! identity to nothing:
//!
//! Key format: `[json_encoded_value][0x00][document_id:16]`
//!
//! JSON text never contains a raw `0x00` byte, so the separator cannot occur
//! inside the encoded value and a value prefix scan never matches a longer
//! value. `null` values are not indexed.

use sled::Tree;
use uuid::Uuid;

use docgraph_proto::{Document, Value};

use crate::error::StoreError;

/// Separator between the encoded value and the document identity.
const SEPARATOR: u8 = 0x00;

/// Prefix shared by all entries holding `value`.
pub(crate) fn value_prefix(value: &Value) -> Result<Vec<u8>, StoreError> {
    let mut key = serde_json::to_vec(value)
        .map_err(|e| docgraph_proto::Error::Serialization(e.to_string()))?;
    key.push(SEPARATOR);
    Ok(key)
}

/// Entry key for `value` held by document `id`.
pub(crate) fn entry_key(value: &Value, id: Uuid) -> Result<Vec<u8>, StoreError> {
    let mut key = value_prefix(value)?;
    key.extend_from_slice(id.as_bytes());
    Ok(key)
}

/// Document identity stored at the tail of an entry key.
pub(crate) fn entry_id(key: &[u8]) -> Option<Uuid> {
    let tail = key.len().checked_sub(16)?;
    Uuid::from_slice(&key[tail..]).ok()
}

/// Value of `field` in `doc` if it should be indexed.
pub(crate) fn indexed_value<'a>(doc: &'a Document, field: &str) -> Option<&'a Value> {
    doc.get(field).filter(|v| !v.is_null())
}

/// Add the entry for `doc` to `index`.
pub(crate) fn insert_entry(
    index: &Tree,
    field: &str,
    id: Uuid,
    doc: &Document,
) -> Result<(), StoreError> {
    if let Some(value) = indexed_value(doc, field) {
        index.insert(entry_key(value, id)?, &[])?;
    }
    Ok(())
}

/// Remove the entry for `doc` from `index`.
pub(crate) fn remove_entry(
    index: &Tree,
    field: &str,
    id: Uuid,
    doc: &Document,
) -> Result<(), StoreError> {
    if let Some(value) = indexed_value(doc, field) {
        index.remove(entry_key(value, id)?)?;
    }
    Ok(())
}

/// Index every document of `documents` on `field`. Returns the number of
/// entries written.
pub(crate) fn backfill(documents: &Tree, index: &Tree, field: &str) -> Result<u64, StoreError> {
    let mut written = 0;
    for item in documents.iter() {
        let (key, bytes) = item?;
        let Ok(id) = Uuid::from_slice(&key) else {
            continue;
        };
        let doc = Document::from_bytes(&bytes)?;
        if indexed_value(&doc, field).is_some() {
            insert_entry(index, field, id, &doc)?;
            written += 1;
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_key_roundtrip() {
        let id = Uuid::new_v4();
        let key = entry_key(&json!("sci-fi"), id).unwrap();

        assert!(key.starts_with(&value_prefix(&json!("sci-fi")).unwrap()));
        assert_eq!(entry_id(&key), Some(id));
    }

    #[test]
    fn test_prefix_does_not_match_longer_value() {
        let short = value_prefix(&json!(1)).unwrap();
        let long = entry_key(&json!(10), Uuid::new_v4()).unwrap();

        assert!(!long.starts_with(&short));
    }

    #[test]
    fn test_null_not_indexed() {
        let mut doc = Document::new();
        doc.insert("isbn", Value::Null);
        assert!(indexed_value(&doc, "isbn").is_none());
        assert!(indexed_value(&doc, "missing").is_none());
    }

    #[test]
    fn test_backfill() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let documents = db.open_tree("docs").unwrap();
        let index = db.open_tree("docs#genre").unwrap();

        for genre in [json!("sci-fi"), json!("fantasy"), Value::Null] {
            let id = Uuid::new_v4();
            let mut doc = Document::new();
            doc.set_id(id);
            doc.insert("genre", genre);
            documents
                .insert(id.as_bytes(), doc.to_bytes().unwrap())
                .unwrap();
        }

        assert_eq!(backfill(&documents, &index, "genre").unwrap(), 2);
        assert_eq!(
            index
                .scan_prefix(value_prefix(&json!("sci-fi")).unwrap())
                .count(),
            1
        );
    }
}
