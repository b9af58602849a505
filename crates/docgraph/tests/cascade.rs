//! Cascade delete over owned and shared references.

mod common;

use std::sync::Arc;

use common::*;
use docgraph::store::{DocumentStore, StoreError};
use docgraph::{Engine, EngineConfig, Error, LazyRefs, Shared};

fn full_book() -> Book {
    Book {
        title: "Complete Works".to_string(),
        author: Some(person("Ada")),
        editor: Some(person("Max")),
        chapters: vec![chapter("I", 12), chapter("II", 18)],
        tags: vec![Shared::new(tag("classic")), Shared::new(tag("poetry"))],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_trash_removes_owned_graph() {
    let (engine, store) = memory_engine();
    let mut book = full_book();
    let id = engine.store(&mut book).await.unwrap();

    let report = engine.trash(&book).await.unwrap();

    assert!(!store.contains("Book", id));
    assert!(report.contains("Book", id));
    assert_eq!(store.document_count("Chapter"), Some(0));
    let author_id = book.author.as_ref().and_then(|a| a.id).unwrap();
    assert!(!store.contains("Person", author_id));

    // shared children stay, only their links go
    assert_eq!(store.document_count("Tag"), Some(2));
    assert_eq!(store.document_count("Book_Tag"), Some(0));
    assert_eq!(report.unlinked.len(), 2);

    // book, author, two chapters
    assert_eq!(report.deleted.len(), 4);
    assert_eq!(report.affected_count(), 6);
}

#[tokio::test]
async fn test_no_cascade_keeps_child() {
    let (engine, store) = memory_engine();
    let mut book = full_book();
    engine.store(&mut book).await.unwrap();

    engine.trash(&book).await.unwrap();

    let editor_id = book.editor.as_ref().and_then(|e| e.id).unwrap();
    assert!(store.contains("Person", editor_id));
    let editor: Person = engine.load(editor_id).await.unwrap();
    assert_eq!(editor.name, "Max");
}

#[tokio::test]
async fn test_shared_children_still_load() {
    let (engine, _store) = memory_engine();
    let mut book = full_book();
    engine.store(&mut book).await.unwrap();
    engine.trash(&book).await.unwrap();

    for shared in &book.tags {
        let loaded: Tag = engine.load(shared.id.unwrap()).await.unwrap();
        assert_eq!(loaded.label, shared.label);
    }
}

#[tokio::test]
async fn test_trash_by_id() {
    let (engine, store) = memory_engine();
    let mut book = full_book();
    let id = engine.store(&mut book).await.unwrap();

    let report = engine.trash_by_id::<Book>(id).await.unwrap();
    assert!(report.contains("Book", id));
    assert_eq!(store.document_count("Chapter"), Some(0));

    let err = engine.trash_by_id::<Book>(id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_trash_unsaved_entity() {
    let (engine, store) = memory_engine();
    let mut stored = person("Ada");
    engine.store(&mut stored).await.unwrap();

    let report = engine.trash(&full_book()).await.unwrap();
    assert_eq!(report.affected_count(), 0);
    assert_eq!(store.document_count("Person"), Some(1));
}

#[tokio::test]
async fn test_child_already_gone() {
    let (engine, store) = memory_engine();
    let mut book = full_book();
    let id = engine.store(&mut book).await.unwrap();

    let first = book.chapters[0].id.unwrap();
    assert!(store.delete("Chapter", first).await.unwrap());

    let report = engine.trash(&book).await.unwrap();
    assert!(report.contains("Book", id));
    assert!(!report.contains("Chapter", first));
    assert_eq!(store.document_count("Chapter"), Some(0));
}

#[tokio::test]
async fn test_trash_loads_lazy_owned_elements() {
    let (engine, store) = memory_engine();
    let mut shelf = Shelf {
        label: "Archive".to_string(),
        volumes: LazyRefs::from(vec![chapter("x", 1), chapter("y", 2)]),
        topics: vec![tag("old")].into_iter().collect(),
        ..Default::default()
    };
    let id = engine.store(&mut shelf).await.unwrap();

    let loaded: Shelf = engine.load(id).await.unwrap();
    assert_eq!(loaded.volumes.pending_ids().len(), 2);

    let report = engine.trash(&loaded).await.unwrap();
    assert_eq!(store.document_count("Chapter"), Some(0));
    assert_eq!(store.document_count("Shelf_Tag"), Some(0));
    assert_eq!(store.document_count("Tag"), Some(1));
    assert_eq!(report.deleted.len(), 3);
    assert_eq!(report.unlinked.len(), 1);
}

#[tokio::test]
async fn test_trash_self_referential_chain() {
    let (engine, store) = memory_engine();
    let mut head = Node {
        value: 1,
        next: Some(Box::new(Node {
            value: 2,
            ..Default::default()
        })),
        ..Default::default()
    };
    engine.store(&mut head).await.unwrap();

    let report = engine.trash(&head).await.unwrap();
    assert_eq!(report.deleted.len(), 2);
    assert_eq!(store.document_count("Node"), Some(0));
}

#[tokio::test]
async fn test_partial_failure_is_not_rolled_back() {
    let store = Arc::new(FlakyStore::new());
    let engine = Engine::new(store.clone(), EngineConfig::new("test"));
    let mut book = full_book();
    let id = engine.store(&mut book).await.unwrap();

    store.fail_deletes_in("Chapter");
    let err = engine.trash(&book).await.unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::Connection(_))));

    // the author went before the chapters failed; the book itself stays
    let author_id = book.author.as_ref().and_then(|a| a.id).unwrap();
    assert!(!store.inner.contains("Person", author_id));
    assert!(store.inner.contains("Book", id));
    assert_eq!(store.inner.document_count("Chapter"), Some(2));
}
