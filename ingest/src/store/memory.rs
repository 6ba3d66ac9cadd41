use crate::store::{distinct_values, Document, DocumentStore, Filter, StoreError};
use serde_json::Value;
use std::collections::HashMap;

/// A document store that only lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: HashMap<String, Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_collection(&self, collection: &str) -> bool {
        self.collections.contains_key(collection)
    }

    fn documents(&self, collection: &str) -> &[Document] {
        self.collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl DocumentStore for MemoryStore {
    fn drop_collection_if_exists(&mut self, collection: &str) -> Result<bool, StoreError> {
        Ok(self.collections.remove(collection).is_some())
    }

    fn create_collection(&mut self, collection: &str) -> Result<(), StoreError> {
        if self.collections.contains_key(collection) {
            return Err(StoreError::CollectionExists(collection.to_string()));
        }
        self.collections.insert(collection.to_string(), Vec::new());
        Ok(())
    }

    fn insert_many(
        &mut self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<usize, StoreError> {
        let count = documents.len();
        self.collections
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
        Ok(count)
    }

    fn distinct(&self, collection: &str, field: &str) -> Result<Vec<Value>, StoreError> {
        Ok(distinct_values(self.documents(collection), field))
    }

    fn count_documents(&self, collection: &str, filter: &Filter) -> Result<usize, StoreError> {
        Ok(self
            .documents(collection)
            .iter()
            .filter(|doc| filter.matches(doc))
            .count())
    }

    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .documents(collection)
            .iter()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect())
    }
}
