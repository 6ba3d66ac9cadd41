//! Import test harness results into a document store.
//!
//! A results tree looks like
//! `<root>/Results/Run_<8 digits>_<9 digits>/<test>/<attempt>/<test>.script.log`. Importing
//! walks it in three stages, [discover], [enumerate] and [parse], sequenced by [pipeline].
//! The records are written through a [store::DocumentStore] and summarised by [report].

#[macro_use]
extern crate log;

pub mod discover;
pub mod enumerate;
pub mod error;
pub mod parse;
pub mod pipeline;
pub mod report;
pub mod store;
pub mod tree;

pub use error::IngestError;
pub use pipeline::{
    collect_attempt_records, replace_collection, IngestOutcome, IngestReport, SkippedAttempt,
};
pub use verdict_model::{AttemptKey, AttemptRecord, RunIdentifier};
