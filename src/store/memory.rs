//! Process-local document store, selected with a `memory://` DSN.

use super::{new_id, Collection, Document, DocumentStore, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn violates_unique(collection: Collection, docs: &[Document], candidate: &Document) -> bool {
    let Some(field) = collection.unique_field() else {
        return false;
    };
    let Some(value) = candidate.field_str(field) else {
        return false;
    };

    docs.iter()
        .any(|doc| doc.id != candidate.id && doc.field_str(field) == Some(value))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: Collection, body: Value) -> Result<Document, StoreError> {
        let doc = Document::new(new_id(), body)?;

        // check and push under one write lock so the unique key holds
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();

        if violates_unique(collection, docs, &doc) {
            return Err(StoreError::Conflict {
                collection,
                field: collection.unique_field().unwrap_or_default(),
            });
        }

        debug!(%collection, id = %doc.id, "memory insert");
        docs.push(doc.clone());

        Ok(doc)
    }

    async fn find_all(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).cloned().unwrap_or_default())
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id))
            .cloned())
    }

    async fn find_one(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| doc.field_str(field) == Some(value)))
            .cloned())
    }

    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        body: Value,
    ) -> Result<Option<Document>, StoreError> {
        let doc = Document::new(id.to_string(), body)?;

        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(None);
        };
        let Some(index) = docs.iter().position(|existing| existing.id == id) else {
            return Ok(None);
        };

        if violates_unique(collection, docs, &doc) {
            return Err(StoreError::Conflict {
                collection,
                field: collection.unique_field().unwrap_or_default(),
            });
        }

        docs[index] = doc.clone();

        Ok(Some(doc))
    }

    async fn push(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<Option<Document>, StoreError> {
        // read-modify-write under the write lock so concurrent appends all land
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
        else {
            return Ok(None);
        };

        match doc
            .body
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            Value::Array(items) => items.push(value),
            _ => {
                return Err(StoreError::NotAnArray {
                    collection,
                    field: field.to_string(),
                })
            }
        }

        debug!(%collection, %id, field, "memory push");

        Ok(Some(doc.clone()))
    }

    async fn delete(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(None);
        };

        Ok(docs
            .iter()
            .position(|doc| doc.id == id)
            .map(|index| docs.remove(index)))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
