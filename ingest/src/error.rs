use std::path::PathBuf;
use thiserror::Error;
use verdict_model::RunIdentifier;

/// A failure that stops an import.
///
/// These are all structural: the results tree changed or became unreadable while it was being
/// walked. Problems with a single attempt's log never surface here, see
/// [crate::parse::SkipReason].
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Invalid run name pattern: {0}")]
    RunPattern(#[from] regex::Error),
    #[error("Failed to list results directory {path:?}: {source}")]
    ResultsUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to list tests of run {run}: {source}")]
    RunUnreadable {
        run: RunIdentifier,
        source: std::io::Error,
    },
    #[error("Failed to list attempts of test {test} in run {run}: {source}")]
    TestUnreadable {
        run: RunIdentifier,
        test: String,
        source: std::io::Error,
    },
}
