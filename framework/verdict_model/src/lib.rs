use serde::{Deserialize, Serialize};
use sha3::Digest;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Verdict token written by the harness for a passing attempt
pub const VERDICT_PASS: &str = "PASS";
/// Verdict token written by the harness for a failing attempt
pub const VERDICT_FAIL: &str = "FAIL";

/// A test collection run, found under the results directory
///
/// Displayed as its path relative to the results root, for example
/// `Results/Run_20230303_084230899`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[display("{parent}/{name}")]
pub struct RunIdentifier {
    parent: String,
    name: String,
}

impl RunIdentifier {
    pub fn new(parent: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            name: name.into(),
        }
    }

    /// The directory holding the run, relative to the root
    pub fn parent(&self) -> &str {
        &self.parent
    }

    /// The run directory name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn relative_path(&self) -> PathBuf {
        Path::new(&self.parent).join(&self.name)
    }
}

/// Identifies one attempt directory, `<run_parent>/<run_name>/<test_name>/<attempt_name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[display("{run_parent}/{run_name}/{test_name}/{attempt_name}")]
pub struct AttemptKey {
    pub run_parent: String,
    pub run_name: String,
    pub test_name: String,
    pub attempt_name: String,
}

impl AttemptKey {
    pub fn new(
        run: &RunIdentifier,
        test_name: impl Into<String>,
        attempt_name: impl Into<String>,
    ) -> Self {
        Self {
            run_parent: run.parent.clone(),
            run_name: run.name.clone(),
            test_name: test_name.into(),
            attempt_name: attempt_name.into(),
        }
    }

    /// The attempt directory, relative to the root
    pub fn attempt_dir(&self) -> PathBuf {
        Path::new(&self.run_parent)
            .join(&self.run_name)
            .join(&self.test_name)
            .join(&self.attempt_name)
    }

    /// The script log the harness writes for this attempt, relative to the root
    ///
    /// The file is named after the test, not the attempt: `<test_name>.script.log`.
    pub fn log_path(&self) -> PathBuf {
        self.attempt_dir().join(format!("{}.script.log", self.test_name))
    }

    /// Compute a fingerprint for this attempt
    ///
    /// Stable for a given position in the results tree, so the same attempt gets the same
    /// document id on every import. Computed using [sha3::Sha3_256].
    pub fn fingerprint(&self) -> String {
        let mut hasher = sha3::Sha3_256::new();
        for part in [
            &self.run_parent,
            &self.run_name,
            &self.test_name,
            &self.attempt_name,
        ] {
            Digest::update(&mut hasher, part.as_bytes());
            Digest::update(&mut hasher, [0u8]);
        }

        format!("{:x}", hasher.finalize())
    }
}

/// The `validate` counters of a script log, in log order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateCounts {
    #[serde(rename = "PASS")]
    pub pass: u64,
    #[serde(rename = "FAIL")]
    pub fail: u64,
}

/// The `messages` counters of a script log, in log order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCounts {
    #[serde(rename = "INFO")]
    pub info: u64,
    #[serde(rename = "WARN")]
    pub warn: u64,
    #[serde(rename = "ERR")]
    pub err: u64,
    #[serde(rename = "PENDING")]
    pub pending: u64,
    #[serde(rename = "INCONCLUSIVE")]
    pub inconclusive: u64,
    #[serde(rename = "N/A")]
    pub not_applicable: u64,
}

/// The normalized result of one test attempt
///
/// Only ever built from a log where every counter and the verdict were found. The verdict is
/// kept as the raw token from the log, since harnesses emit more than [VERDICT_PASS] and
/// [VERDICT_FAIL].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub run_parent: String,
    pub run_name: String,
    pub test_name: String,
    pub attempt_name: String,
    /// The attempt directory relative to the import root, so the attempt's other files can be
    /// found later.
    pub attempt_path: String,
    pub final_verdict: String,
    #[serde(flatten)]
    pub validate: ValidateCounts,
    #[serde(flatten)]
    pub messages: MessageCounts,
}

impl AttemptRecord {
    pub fn new(
        key: &AttemptKey,
        final_verdict: String,
        validate: ValidateCounts,
        messages: MessageCounts,
    ) -> Self {
        Self {
            run_parent: key.run_parent.clone(),
            run_name: key.run_name.clone(),
            test_name: key.test_name.clone(),
            attempt_name: key.attempt_name.clone(),
            attempt_path: key.attempt_dir().to_string_lossy().into_owned(),
            final_verdict,
            validate,
            messages,
        }
    }

    pub fn key(&self) -> AttemptKey {
        AttemptKey {
            run_parent: self.run_parent.clone(),
            run_name: self.run_name.clone(),
            test_name: self.test_name.clone(),
            attempt_name: self.attempt_name.clone(),
        }
    }

    pub fn fingerprint(&self) -> String {
        self.key().fingerprint()
    }
}

/// Append attempt records to a file
///
/// Each record is serialized to JSON and output as a single line followed by a newline. The
/// recommended file extension is `.jsonl`.
pub fn append_attempt_records(records: &[AttemptRecord], path: PathBuf) -> anyhow::Result<()> {
    let file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;
    let mut writer = std::io::BufWriter::new(file);
    for record in records {
        store_attempt_record(record, &mut writer)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Serialize an attempt record to a writer
pub fn store_attempt_record<W: Write>(
    record: &AttemptRecord,
    writer: &mut W,
) -> anyhow::Result<()> {
    serde_json::to_writer(writer, record)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_key() -> AttemptKey {
        let run = RunIdentifier::new("Results", "Run_20230303_084230899");
        AttemptKey::new(&run, "LL_CON_CEN_BV_04", "1")
    }

    fn sample_record() -> AttemptRecord {
        AttemptRecord::new(
            &sample_key(),
            "PASS".to_string(),
            ValidateCounts {
                pass: 2505,
                fail: 0,
            },
            MessageCounts {
                info: 4104,
                warn: 1,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_should_build_paths_from_key() {
        let key = sample_key();

        assert_eq!(
            key.to_string(),
            "Results/Run_20230303_084230899/LL_CON_CEN_BV_04/1"
        );
        assert_eq!(
            key.log_path(),
            PathBuf::from(
                "Results/Run_20230303_084230899/LL_CON_CEN_BV_04/1/LL_CON_CEN_BV_04.script.log"
            )
        );
    }

    #[test]
    fn test_should_serialize_counters_with_log_labels() {
        let value = serde_json::to_value(sample_record()).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "run_parent": "Results",
                "run_name": "Run_20230303_084230899",
                "test_name": "LL_CON_CEN_BV_04",
                "attempt_name": "1",
                "attempt_path": "Results/Run_20230303_084230899/LL_CON_CEN_BV_04/1",
                "final_verdict": "PASS",
                "PASS": 2505,
                "FAIL": 0,
                "INFO": 4104,
                "WARN": 1,
                "ERR": 0,
                "PENDING": 0,
                "INCONCLUSIVE": 0,
                "N/A": 0,
            })
        );
    }

    #[test]
    fn test_should_ignore_unknown_fields_when_loading() {
        let mut value = serde_json::to_value(sample_record()).unwrap();
        value["_id"] = serde_json::json!("abc");

        let record: AttemptRecord = serde_json::from_value(value).unwrap();

        assert_eq!(record, sample_record());
    }

    #[test]
    fn test_fingerprint_depends_on_every_key_part() {
        let key = sample_key();
        let mut other = key.clone();
        other.attempt_name = "2".to_string();

        assert_eq!(key.fingerprint(), sample_key().fingerprint());
        assert_ne!(key.fingerprint(), other.fingerprint());

        // Joining without a separator would make these collide
        let mut shifted = key.clone();
        shifted.test_name = "LL_CON_CEN_BV_0".to_string();
        shifted.attempt_name = "41".to_string();
        assert_ne!(key.fingerprint(), shifted.fingerprint());
    }

    #[test]
    fn test_should_append_records_as_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.jsonl");

        let first = sample_record();
        let mut second = sample_record();
        second.attempt_name = "2".to_string();
        second.final_verdict = "FAIL".to_string();

        append_attempt_records(&[first.clone()], path.clone()).unwrap();
        append_attempt_records(&[second.clone()], path.clone()).unwrap();

        let loaded = std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str::<AttemptRecord>(line).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(loaded, vec![first, second]);
    }
}
