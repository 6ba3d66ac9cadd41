use crate::discover::discover_runs;
use crate::enumerate::enumerate_attempts;
use crate::error::IngestError;
use crate::parse::{parse_attempt, SkipReason};
use crate::store::{record_to_document, DocumentStore, StoreError};
use crate::tree::ResultsTree;
use serde::Serialize;
use std::path::PathBuf;
use verdict_model::{AttemptKey, AttemptRecord};

/// An attempt that did not produce a record
#[derive(Debug)]
pub struct SkippedAttempt {
    pub key: AttemptKey,
    pub reason: SkipReason,
}

/// Everything collected from one pass over a results tree
#[derive(Debug, Default)]
pub struct IngestOutcome {
    /// Records in discovery order
    pub records: Vec<AttemptRecord>,
    pub skipped: Vec<SkippedAttempt>,
}

impl IngestOutcome {
    /// The number of records collected
    pub fn count(&self) -> usize {
        self.records.len()
    }
}

/// Summary of one import, written out after `load` so skipped attempts can be followed up
#[derive(Debug, Serialize)]
pub struct IngestReport {
    pub root: PathBuf,
    pub collection: String,
    pub total_records: usize,
    pub skipped: Vec<SkippedEntry>,
}

#[derive(Debug, Serialize)]
pub struct SkippedEntry {
    pub attempt: String,
    pub log_path: PathBuf,
    pub reason: String,
}

impl IngestReport {
    pub fn new(root: impl Into<PathBuf>, collection: &str, outcome: &IngestOutcome) -> Self {
        Self {
            root: root.into(),
            collection: collection.to_string(),
            total_records: outcome.count(),
            skipped: outcome
                .skipped
                .iter()
                .map(|skipped| SkippedEntry {
                    attempt: skipped.key.to_string(),
                    log_path: skipped.key.log_path(),
                    reason: skipped.reason.to_string(),
                })
                .collect(),
        }
    }
}

/// Walk a results tree and collect a record for every attempt that has a usable script log.
///
/// Attempts without a log, or with a malformed one, are logged and listed in
/// [IngestOutcome::skipped]; they never stop the walk. Only failing to list a run or test
/// directory is returned as an error.
pub fn collect_attempt_records<T>(tree: &T) -> Result<IngestOutcome, IngestError>
where
    T: ResultsTree + ?Sized,
{
    let mut outcome = IngestOutcome::default();

    let runs = discover_runs(tree)?;
    debug!("Discovered {} runs", runs.len());

    for run in runs {
        let attempts = enumerate_attempts(tree, &run)?;
        debug!("Found {} attempts in {run}", attempts.len());

        for key in attempts {
            match parse_attempt(tree, &key) {
                Ok(record) => {
                    trace!("Collected {record:?}");
                    outcome.records.push(record);
                }
                Err(reason) => {
                    match &reason {
                        SkipReason::MissingLog => {
                            info!("Failed to get results for {key}: {reason}")
                        }
                        SkipReason::Malformed(_) => warn!(
                            "Failed to get results for {key} from {}: {reason}",
                            key.log_path().display()
                        ),
                    }
                    outcome.skipped.push(SkippedAttempt { key, reason });
                }
            }
        }
    }

    info!(
        "Collected {} test attempt results, skipped {} attempts",
        outcome.count(),
        outcome.skipped.len()
    );

    Ok(outcome)
}

/// Make `collection` hold exactly `records`.
///
/// The collection is dropped if it exists, recreated and then filled, so running this twice with
/// the same records leaves the same contents. Returns the number of documents written.
pub fn replace_collection<S>(
    store: &mut S,
    collection: &str,
    records: &[AttemptRecord],
) -> Result<usize, StoreError>
where
    S: DocumentStore + ?Sized,
{
    let documents = records
        .iter()
        .map(record_to_document)
        .collect::<Result<Vec<_>, _>>()?;

    if store.drop_collection_if_exists(collection)? {
        debug!("Dropped existing collection {collection}");
    }
    store.create_collection(collection)?;

    store.insert_many(collection, documents)
}
