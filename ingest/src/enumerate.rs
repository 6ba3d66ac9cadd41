use crate::error::IngestError;
use crate::tree::ResultsTree;
use verdict_model::{AttemptKey, RunIdentifier};

/// List every attempt of every test in a run.
///
/// Each subdirectory of the run is a test and each subdirectory of a test is an attempt; nothing
/// deeper is visited. Tests without attempts contribute nothing.
///
/// The run came from [crate::discover::discover_runs], so a run or test directory that cannot
/// be listed means the tree changed under us and is returned as an error.
pub fn enumerate_attempts<T>(
    tree: &T,
    run: &RunIdentifier,
) -> Result<Vec<AttemptKey>, IngestError>
where
    T: ResultsTree + ?Sized,
{
    let run_path = run.relative_path();
    let tests = tree
        .list_dirs(&run_path)
        .map_err(|source| IngestError::RunUnreadable {
            run: run.clone(),
            source,
        })?;

    let mut attempts = Vec::new();
    for test in tests {
        let attempt_names = tree.list_dirs(&run_path.join(&test)).map_err(|source| {
            IngestError::TestUnreadable {
                run: run.clone(),
                test: test.clone(),
                source,
            }
        })?;

        if attempt_names.is_empty() {
            debug!("Test {test} in run {run} has no attempts");
        }

        attempts.extend(
            attempt_names
                .into_iter()
                .map(|attempt| AttemptKey::new(run, test.as_str(), attempt)),
        );
    }

    Ok(attempts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::MemoryTree;
    use pretty_assertions::assert_eq;

    const RUN: &str = "Run_20230303_084230899";

    fn run() -> RunIdentifier {
        RunIdentifier::new("Results", RUN)
    }

    #[test]
    fn test_should_emit_one_key_per_attempt() {
        let tree = MemoryTree::new()
            .with_dir(format!("Results/{RUN}/T1/1"))
            .with_dir(format!("Results/{RUN}/T1/2"))
            .with_dir(format!("Results/{RUN}/T2/1"));

        let attempts = enumerate_attempts(&tree, &run()).unwrap();

        assert_eq!(
            attempts,
            vec![
                AttemptKey::new(&run(), "T1", "1"),
                AttemptKey::new(&run(), "T1", "2"),
                AttemptKey::new(&run(), "T2", "1"),
            ]
        );
        assert_eq!(attempts[0].run_parent, "Results");
        assert_eq!(attempts[0].run_name, RUN);
    }

    #[test]
    fn test_should_skip_tests_without_attempts() {
        let tree = MemoryTree::new()
            .with_dir(format!("Results/{RUN}/T1"))
            .with_dir(format!("Results/{RUN}/T2/1"));

        let attempts = enumerate_attempts(&tree, &run()).unwrap();

        assert_eq!(attempts, vec![AttemptKey::new(&run(), "T2", "1")]);
    }

    #[test]
    fn test_should_skip_files_at_both_levels() {
        let tree = MemoryTree::new()
            .with_file(format!("Results/{RUN}/summary.html"), "")
            .with_file(format!("Results/{RUN}/T1/T1.script.log"), "")
            .with_dir(format!("Results/{RUN}/T1/1"));

        let attempts = enumerate_attempts(&tree, &run()).unwrap();

        assert_eq!(attempts, vec![AttemptKey::new(&run(), "T1", "1")]);
    }

    #[test]
    fn test_should_not_descend_below_attempts() {
        let tree = MemoryTree::new().with_dir(format!("Results/{RUN}/T1/1/screenshots/deep"));

        let attempts = enumerate_attempts(&tree, &run()).unwrap();

        assert_eq!(attempts, vec![AttemptKey::new(&run(), "T1", "1")]);
    }

    #[test]
    fn test_should_fail_for_missing_run() {
        let tree = MemoryTree::new().with_dir("Results");

        let err = enumerate_attempts(&tree, &run()).unwrap_err();

        assert!(matches!(err, IngestError::RunUnreadable { .. }));
    }
}
