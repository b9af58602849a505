//! Shared reference sequences and their join relations.

mod common;

use std::collections::HashSet;

use serde_json::Value;

use common::*;
use docgraph::store::proto::{JoinRow, PARENT_KEY};
use docgraph::{Engine, Shared};

fn tagged_book(labels: &[&str]) -> Book {
    Book {
        title: "Tagged".to_string(),
        tags: labels.iter().map(|label| Shared::new(tag(label))).collect(),
        ..Default::default()
    }
}

async fn join_rows(engine: &Engine, book: &Book) -> Vec<JoinRow> {
    let parent = book.id.unwrap().to_string();
    engine
        .backend()
        .query_by_index("Book_Tag", PARENT_KEY, &Value::String(parent))
        .await
        .unwrap()
        .iter()
        .map(|doc| JoinRow::from_document(doc).unwrap())
        .collect()
}

#[tokio::test]
async fn test_store_writes_one_row_per_element() {
    let (engine, store) = memory_engine();
    let mut book = tagged_book(&["fiction", "classic"]);
    engine.store(&mut book).await.unwrap();

    assert_eq!(store.document_count("Tag"), Some(2));
    assert_eq!(store.document_count("Book_Tag"), Some(2));
    assert!(book.tags.iter().all(|t| t.link_id().is_some()));

    let mut rows = join_rows(&engine, &book).await;
    rows.sort_by_key(|row| row.position);
    let children: Vec<_> = rows.iter().map(|row| row.child_id).collect();
    let tag_ids: Vec<_> = book.tags.iter().filter_map(|t| t.id).collect();
    assert_eq!(children, tag_ids);

    let links: Vec<_> = rows.iter().map(|row| row.id).collect();
    let stamped: Vec<_> = book.tags.iter().map(|t| t.link_id()).collect();
    assert_eq!(links, stamped);
}

#[tokio::test]
async fn test_restore_reuses_rows() {
    let (engine, store) = memory_engine();
    let mut book = tagged_book(&["fiction", "classic"]);
    engine.store(&mut book).await.unwrap();
    let links: Vec<_> = book.tags.iter().map(|t| t.link_id()).collect();

    engine.store(&mut book).await.unwrap();
    assert_eq!(store.document_count("Book_Tag"), Some(2));
    let relinked: Vec<_> = book.tags.iter().map(|t| t.link_id()).collect();
    assert_eq!(relinked, links);

    let mut loaded: Book = engine.load(book.id.unwrap()).await.unwrap();
    engine.store(&mut loaded).await.unwrap();
    assert_eq!(store.document_count("Book_Tag"), Some(2));
}

#[tokio::test]
async fn test_removed_element_is_unlinked() {
    let (engine, store) = memory_engine();
    let mut book = tagged_book(&["fiction", "classic", "poetry"]);
    engine.store(&mut book).await.unwrap();

    let dropped = book.tags.remove(1);
    engine.store(&mut book).await.unwrap();

    assert_eq!(store.document_count("Book_Tag"), Some(2));
    assert!(!store.contains("Book_Tag", dropped.link_id().unwrap()));
    // the shared child itself stays
    assert!(store.contains("Tag", dropped.id.unwrap()));

    let loaded: Book = engine.load(book.id.unwrap()).await.unwrap();
    let labels: Vec<_> = loaded.tags.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, ["fiction", "poetry"]);
}

#[tokio::test]
async fn test_reorder_is_persisted() {
    let (engine, store) = memory_engine();
    let mut book = tagged_book(&["a", "b", "c"]);
    engine.store(&mut book).await.unwrap();

    book.tags.reverse();
    engine.store(&mut book).await.unwrap();
    assert_eq!(store.document_count("Book_Tag"), Some(3));

    let loaded: Book = engine.load(book.id.unwrap()).await.unwrap();
    let labels: Vec<_> = loaded.tags.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, ["c", "b", "a"]);
}

#[tokio::test]
async fn test_child_shared_between_parents() {
    let (engine, store) = memory_engine();
    let mut first = tagged_book(&["classic"]);
    engine.store(&mut first).await.unwrap();

    let shared_tag = first.tags[0].clone().into_inner();
    let mut second = Book {
        title: "Second".to_string(),
        tags: vec![Shared::new(shared_tag.clone())],
        ..Default::default()
    };
    engine.store(&mut second).await.unwrap();

    assert_eq!(store.document_count("Tag"), Some(1));
    assert_eq!(store.document_count("Book_Tag"), Some(2));
    assert_ne!(first.tags[0].link_id(), second.tags[0].link_id());

    let loaded: Book = engine.load(second.id.unwrap()).await.unwrap();
    assert_eq!(loaded.tags[0].id, shared_tag.id);
    assert_eq!(join_rows(&engine, &first).await.len(), 1);
}

#[tokio::test]
async fn test_empty_sequence_writes_no_rows() {
    let (engine, store) = memory_engine();
    let mut book = tagged_book(&[]);
    engine.store(&mut book).await.unwrap();

    assert_eq!(store.document_count("Book_Tag"), Some(0));
    let loaded: Book = engine.load(book.id.unwrap()).await.unwrap();
    assert!(loaded.tags.is_empty());
}

#[tokio::test]
async fn test_loaded_element_copied_to_another_parent() {
    let (engine, store) = memory_engine();
    let mut first = tagged_book(&["classic"]);
    engine.store(&mut first).await.unwrap();
    let loaded: Book = engine.load(first.id.unwrap()).await.unwrap();

    let mut second = Book {
        title: "Second".to_string(),
        tags: vec![loaded.tags[0].clone()],
        ..Default::default()
    };
    engine.store(&mut second).await.unwrap();

    assert_eq!(store.document_count("Book_Tag"), Some(2));
    assert_ne!(second.tags[0].link_id(), first.tags[0].link_id());
    assert!(store.contains("Book_Tag", first.tags[0].link_id().unwrap()));

    let first_again: Book = engine.load(first.id.unwrap()).await.unwrap();
    assert_eq!(first_again.tags.len(), 1);
    assert_eq!(first_again.tags[0].label, "classic");
    let second_again: Book = engine.load(second.id.unwrap()).await.unwrap();
    assert_eq!(second_again.tags.len(), 1);
    assert_eq!(second_again.tags[0].id, first.tags[0].id);
}

#[tokio::test]
async fn test_stored_parent_receives_foreign_link() {
    let (engine, store) = memory_engine();
    let mut first = tagged_book(&["classic"]);
    engine.store(&mut first).await.unwrap();
    let mut second = tagged_book(&["modern"]);
    engine.store(&mut second).await.unwrap();

    second.tags.push(first.tags[0].clone());
    engine.store(&mut second).await.unwrap();

    assert_eq!(store.document_count("Book_Tag"), Some(3));
    assert_eq!(join_rows(&engine, &first).await.len(), 1);
    assert_eq!(join_rows(&engine, &second).await.len(), 2);
    assert_ne!(second.tags[1].link_id(), first.tags[0].link_id());

    let labels: Vec<_> = engine
        .load::<Book>(second.id.unwrap())
        .await
        .unwrap()
        .tags
        .iter()
        .map(|t| t.label.clone())
        .collect();
    assert_eq!(labels, ["modern", "classic"]);
}

#[tokio::test]
async fn test_repeated_element_keeps_every_position() {
    let (engine, store) = memory_engine();
    let mut book = tagged_book(&["x", "y"]);
    engine.store(&mut book).await.unwrap();

    let again = book.tags[0].clone();
    book.tags.push(again);
    engine.store(&mut book).await.unwrap();

    assert_eq!(store.document_count("Tag"), Some(2));
    assert_eq!(store.document_count("Book_Tag"), Some(3));
    let links: HashSet<_> = book.tags.iter().filter_map(|t| t.link_id()).collect();
    assert_eq!(links.len(), 3);

    let loaded: Book = engine.load(book.id.unwrap()).await.unwrap();
    let labels: Vec<_> = loaded.tags.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, ["x", "y", "x"]);
}
