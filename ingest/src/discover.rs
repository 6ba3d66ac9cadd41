use crate::error::IngestError;
use crate::tree::ResultsTree;
use regex::Regex;
use std::path::Path;
use verdict_model::RunIdentifier;

/// The directory under the root that holds the test collection runs
pub const RESULTS_DIR: &str = "Results";

/// Anchored at the start only, `Run_20230303_084230899_extra` is still a run
const RUN_NAME_PATTERN: &str = r"^Run_\d{8}_\d{9}";

/// Matches directory names of test collection runs, e.g. `Run_20230303_084230899`.
#[derive(Debug, Clone)]
pub struct RunNamePattern(Regex);

impl RunNamePattern {
    pub fn new() -> Result<Self, IngestError> {
        Ok(Self(Regex::new(RUN_NAME_PATTERN)?))
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.0.is_match(name)
    }
}

/// List the test collection runs under `<root>/Results`.
///
/// A missing `Results` directory means there is nothing to import and gives an empty list.
/// Entries that are not directories, or whose names are not run names, are skipped. Runs are
/// returned in the order the tree lists them.
pub fn discover_runs<T>(tree: &T) -> Result<Vec<RunIdentifier>, IngestError>
where
    T: ResultsTree + ?Sized,
{
    let pattern = RunNamePattern::new()?;
    let results = Path::new(RESULTS_DIR);

    if !tree.is_dir(results) {
        debug!("No {RESULTS_DIR} directory, nothing to discover");
        return Ok(Vec::new());
    }

    let names = tree
        .list_dirs(results)
        .map_err(|source| IngestError::ResultsUnreadable {
            path: results.to_path_buf(),
            source,
        })?;

    Ok(names
        .into_iter()
        .filter(|name| {
            let matched = pattern.is_match(name);
            if !matched {
                trace!("Ignoring {RESULTS_DIR}/{name}, not a run directory");
            }
            matched
        })
        .map(|name| RunIdentifier::new(RESULTS_DIR, name))
        .collect())
}
