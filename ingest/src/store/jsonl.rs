use crate::store::{distinct_values, Document, DocumentStore, Filter, MemoryStore, StoreError};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead as _, BufReader, BufWriter, Write as _};
use std::path::{Path, PathBuf};

/// A document store kept on disk, one JSON Lines file per collection.
///
/// Collection `name` is stored as `<dir>/<name>.jsonl` with one document per line, so the store
/// outlives the process and can be inspected with ordinary tools.
///
/// Every read re-parses the whole collection file. Callers that query a collection many times,
/// like the reports, should read from a [JsonlStore::snapshot] instead.
#[derive(Debug, Clone)]
pub struct JsonlStore {
    dir: PathBuf,
}

impl JsonlStore {
    /// Open the store in `dir`, creating the directory if it does not exist.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load `collection` once into a [MemoryStore] holding just that collection.
    pub fn snapshot(&self, collection: &str) -> Result<MemoryStore, StoreError> {
        let documents = self.load(collection)?;
        debug!(
            "Loaded {} documents from collection {collection}",
            documents.len()
        );

        let mut snapshot = MemoryStore::new();
        snapshot.insert_many(collection, documents)?;
        Ok(snapshot)
    }

    fn collection_path(&self, collection: &str) -> Result<PathBuf, StoreError> {
        if collection.is_empty()
            || collection.starts_with('.')
            || collection.contains(['/', '\\'])
        {
            return Err(StoreError::InvalidCollectionName(collection.to_string()));
        }
        Ok(self.dir.join(format!("{collection}.jsonl")))
    }

    fn load(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let path = self.collection_path(collection)?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut documents = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(&line)? {
                Value::Object(document) => documents.push(document),
                _ => {
                    return Err(StoreError::NotAnObject {
                        collection: collection.to_string(),
                        line: index + 1,
                    })
                }
            }
        }
        Ok(documents)
    }
}

impl DocumentStore for JsonlStore {
    fn drop_collection_if_exists(&mut self, collection: &str) -> Result<bool, StoreError> {
        match std::fs::remove_file(self.collection_path(collection)?) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn create_collection(&mut self, collection: &str) -> Result<(), StoreError> {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.collection_path(collection)?)
        {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(StoreError::CollectionExists(collection.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn insert_many(
        &mut self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<usize, StoreError> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(self.collection_path(collection)?)?;
        let mut writer = BufWriter::new(file);
        for document in &documents {
            serde_json::to_writer(&mut writer, document)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        debug!(
            "Wrote {} documents to {}",
            documents.len(),
            self.collection_path(collection)?.display()
        );
        Ok(documents.len())
    }

    fn distinct(&self, collection: &str, field: &str) -> Result<Vec<Value>, StoreError> {
        Ok(distinct_values(&self.load(collection)?, field))
    }

    fn count_documents(&self, collection: &str, filter: &Filter) -> Result<usize, StoreError> {
        Ok(self
            .load(collection)?
            .iter()
            .filter(|doc| filter.matches(doc))
            .count())
    }

    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .load(collection)?
            .into_iter()
            .filter(|doc| filter.matches(doc))
            .collect())
    }
}
