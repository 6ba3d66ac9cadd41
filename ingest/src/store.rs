mod jsonl;
mod memory;

use serde_json::Value;
use thiserror::Error;
use verdict_model::AttemptRecord;

pub use jsonl::JsonlStore;
pub use memory::MemoryStore;

/// A stored document, a JSON object keyed by field name
pub type Document = serde_json::Map<String, Value>;

/// Document field holding the document id
pub const ID_FIELD: &str = "_id";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Collection already exists: {0}")]
    CollectionExists(String),
    #[error("Invalid collection name: {0:?}")]
    InvalidCollectionName(String),
    #[error("Line {line} of collection {collection} is not a JSON object")]
    NotAnObject { collection: String, line: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serde JSON error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Field equality filter, a document matches when every listed field holds the listed value.
///
/// An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Document);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.0
            .iter()
            .all(|(field, value)| document.get(field) == Some(value))
    }
}

/// The document store operations the importer and reports need.
///
/// Collections are named groups of documents. Reading a collection that does not exist behaves
/// like reading an empty one.
pub trait DocumentStore {
    /// Remove a collection and all of its documents. Returns whether it existed.
    fn drop_collection_if_exists(&mut self, collection: &str) -> Result<bool, StoreError>;

    /// Create an empty collection. Fails if it already exists.
    fn create_collection(&mut self, collection: &str) -> Result<(), StoreError>;

    /// Add documents to a collection, creating it if needed. Returns how many were added.
    fn insert_many(
        &mut self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<usize, StoreError>;

    /// The distinct values of `field`, in the order they are first seen.
    ///
    /// Documents without the field are ignored.
    fn distinct(&self, collection: &str, field: &str) -> Result<Vec<Value>, StoreError>;

    /// The number of documents matching `filter`.
    fn count_documents(&self, collection: &str, filter: &Filter) -> Result<usize, StoreError>;

    /// Every document matching `filter`, in insertion order.
    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError>;
}

/// Convert a record to the document stored for it.
///
/// The document id is the attempt's fingerprint, so re-importing the same tree gives the same
/// ids.
pub fn record_to_document(record: &AttemptRecord) -> Result<Document, StoreError> {
    let mut document = match serde_json::to_value(record)? {
        Value::Object(document) => document,
        _ => Document::new(),
    };
    document.insert(ID_FIELD.to_string(), Value::String(record.fingerprint()));
    Ok(document)
}

/// Read a record back from a stored document. Fields that are not part of a record are ignored.
pub fn document_to_record(document: Document) -> Result<AttemptRecord, StoreError> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

pub(crate) fn distinct_values<'a>(
    documents: impl IntoIterator<Item = &'a Document>,
    field: &str,
) -> Vec<Value> {
    let mut values: Vec<Value> = Vec::new();
    for value in documents.into_iter().filter_map(|doc| doc.get(field)) {
        if !values.contains(value) {
            values.push(value.clone());
        }
    }
    values
}
