mod schema;

use crate::tree::ResultsTree;
use std::io::BufRead;
use thiserror::Error;
use verdict_model::{AttemptKey, AttemptRecord, MessageCounts, ValidateCounts};

pub use schema::{CounterEntry, CounterSchema, LabelMismatch, MESSAGES_SCHEMA, VALIDATE_SCHEMA};

/// Marks the line holding the attempt's outcome, e.g. `>>>> Final Verdict: PASS - "X" <<<<`
pub const VERDICT_MARKER: &str = "Final Verdict";

/// Why a script log that exists did not produce a record
#[derive(Error, Debug)]
pub enum MalformedLog {
    #[error("No `{section}` line found")]
    MissingSection { section: &'static str },
    #[error("No `Final Verdict` line found")]
    MissingVerdict,
    #[error("The `{section}` line has no `=`")]
    MissingAssignment { section: &'static str },
    #[error("Entry {position} of the `{section}` line has no count: {entry:?}")]
    MissingCount {
        section: &'static str,
        position: usize,
        entry: String,
    },
    #[error("Entry {position} of the `{section}` line is not a count: {value:?}")]
    InvalidCount {
        section: &'static str,
        position: usize,
        value: String,
    },
    #[error("The `{section}` line has {found} counts, expected {expected}")]
    TooFewCounts {
        section: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("The `Final Verdict` line has no verdict after its last `:`: {line:?}")]
    MissingVerdictToken { line: String },
    #[error("Failed to read log: {0}")]
    Io(#[from] std::io::Error),
}

/// Why an attempt produced no record
#[derive(Error, Debug)]
pub enum SkipReason {
    /// The attempt has no script log yet. Expected for placeholder or incomplete attempts.
    #[error("No script log")]
    MissingLog,
    #[error("Malformed script log: {0}")]
    Malformed(#[from] MalformedLog),
}

/// Parse the script log of one attempt into a record.
///
/// The log is `<attempt dir>/<test name>.script.log`. Nothing is returned for the attempt unless
/// the log exists and its `validate`, `messages` and verdict lines were all read successfully.
pub fn parse_attempt<T>(tree: &T, key: &AttemptKey) -> Result<AttemptRecord, SkipReason>
where
    T: ResultsTree + ?Sized,
{
    let log_path = key.log_path();
    let reader = tree
        .open_file(&log_path)
        .map_err(MalformedLog::from)?
        .ok_or(SkipReason::MissingLog)?;

    Ok(parse_log(reader, key)?)
}

/// Parse script log content for the attempt `key`.
///
/// Lines are scanned in order. A line starting with `validate` or `messages` supplies that
/// section's counters and any line containing `Final Verdict` supplies the verdict; for each, the
/// last such line wins. Bytes that are not valid UTF-8 are replaced rather than failing the read.
pub fn parse_log<R: BufRead>(
    mut reader: R,
    key: &AttemptKey,
) -> Result<AttemptRecord, MalformedLog> {
    let mut validate = None;
    let mut messages = None;
    let mut verdict = None;

    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);

        if VALIDATE_SCHEMA.matches(&line) {
            validate = Some(VALIDATE_SCHEMA.extract(&line)?);
        }
        if MESSAGES_SCHEMA.matches(&line) {
            messages = Some(MESSAGES_SCHEMA.extract(&line)?);
        }
        if line.contains(VERDICT_MARKER) {
            verdict = Some(extract_verdict(&line)?);
        }
    }

    let validate = validate.ok_or(MalformedLog::MissingSection {
        section: VALIDATE_SCHEMA.section(),
    })?;
    let messages = messages.ok_or(MalformedLog::MissingSection {
        section: MESSAGES_SCHEMA.section(),
    })?;
    let final_verdict = verdict.ok_or(MalformedLog::MissingVerdict)?;

    warn_on_label_mismatch(&VALIDATE_SCHEMA, &validate, key);
    warn_on_label_mismatch(&MESSAGES_SCHEMA, &messages, key);

    let [pass, fail] = VALIDATE_SCHEMA.positional::<2>(&validate)?;
    let [info, warn, err, pending, inconclusive, not_applicable] =
        MESSAGES_SCHEMA.positional::<6>(&messages)?;

    Ok(AttemptRecord::new(
        key,
        final_verdict,
        ValidateCounts { pass, fail },
        MessageCounts {
            info,
            warn,
            err,
            pending,
            inconclusive,
            not_applicable,
        },
    ))
}

/// The first word after the last `:` of a verdict line.
///
/// The last colon is used because the line may start with a timestamp, as in
/// `12:00:00 >>>> Final Verdict: FAIL - "Y" <<<<`.
pub fn extract_verdict(line: &str) -> Result<String, MalformedLog> {
    line.rsplit_once(':')
        .and_then(|(_, tail)| tail.split_whitespace().next())
        .map(str::to_string)
        .ok_or_else(|| MalformedLog::MissingVerdictToken {
            line: line.trim_end().to_string(),
        })
}

fn warn_on_label_mismatch(schema: &CounterSchema, entries: &[CounterEntry], key: &AttemptKey) {
    for mismatch in schema.mismatches(entries) {
        warn!(
            "Entry {} of `{}` in {} is labelled {:?}, expected {:?}. Using it by position",
            mismatch.position,
            schema.section(),
            key.log_path().display(),
            mismatch.found,
            mismatch.expected,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::MemoryTree;
    use pretty_assertions::assert_eq;
    use verdict_model::RunIdentifier;

    const VALIDATE: &str = "validate     = { PASS:5, FAIL:2 }";
    const MESSAGES: &str =
        "messages     = { INFO:10, WARN:1, ERR:0, PENDING:0, INCONCLUSIVE:0, N/A:0 }";
    const VERDICT: &str = ">>>> Final Verdict: PASS - \"X\" <<<<";

    fn key() -> AttemptKey {
        AttemptKey::new(
            &RunIdentifier::new("Results", "Run_20230303_084230899"),
            "X",
            "1",
        )
    }

    fn log(lines: &[&str]) -> String {
        let mut log = lines.join("\n");
        log.push('\n');
        log
    }

    #[test]
    fn test_should_parse_well_formed_log() {
        let record = parse_log(log(&[VALIDATE, MESSAGES, VERDICT]).as_bytes(), &key()).unwrap();

        assert_eq!(
            record,
            AttemptRecord::new(
                &key(),
                "PASS".to_string(),
                ValidateCounts { pass: 5, fail: 2 },
                MessageCounts {
                    info: 10,
                    warn: 1,
                    ..Default::default()
                },
            )
        );
        assert_eq!(record.attempt_path, "Results/Run_20230303_084230899/X/1");
    }

    #[test]
    fn test_should_parse_log_with_surrounding_noise() {
        let content = log(&[
            "Script started",
            "[10:41:02] step 1 ok",
            VALIDATE,
            "some other = { A:1 }",
            MESSAGES,
            "Summary",
            VERDICT,
            "Script finished",
        ]);

        let record = parse_log(content.as_bytes(), &key()).unwrap();

        assert_eq!(record.validate, ValidateCounts { pass: 5, fail: 2 });
        assert_eq!(record.final_verdict, "PASS");
    }

    #[test]
    fn test_should_use_last_colon_for_verdict() {
        let content = log(&[
            VALIDATE,
            MESSAGES,
            "12:00:00 >>>> Final Verdict: FAIL - \"Y\" <<<<",
        ]);

        let record = parse_log(content.as_bytes(), &key()).unwrap();

        assert_eq!(record.final_verdict, "FAIL");
    }

    #[test]
    fn test_should_keep_unrecognised_verdict_tokens() {
        let content = log(&[VALIDATE, MESSAGES, ">>>> Final Verdict: INCONCLUSIVE <<<<"]);

        let record = parse_log(content.as_bytes(), &key()).unwrap();

        assert_eq!(record.final_verdict, "INCONCLUSIVE");
    }

    #[test]
    fn test_should_require_all_three_fields() {
        let cases: [(&[&str], fn(&MalformedLog) -> bool); 3] = [
            (&[MESSAGES, VERDICT], |e| {
                matches!(e, MalformedLog::MissingSection { section: "validate" })
            }),
            (&[VALIDATE, VERDICT], |e| {
                matches!(e, MalformedLog::MissingSection { section: "messages" })
            }),
            (&[VALIDATE, MESSAGES], |e| {
                matches!(e, MalformedLog::MissingVerdict)
            }),
        ];

        for (lines, expected) in cases {
            let err = parse_log(log(lines).as_bytes(), &key()).unwrap_err();
            assert!(expected(&err), "unexpected error for {lines:?}: {err}");
        }
    }

    #[test]
    fn test_should_reject_non_numeric_count() {
        let content = log(&["validate = { PASS:five, FAIL:2 }", MESSAGES, VERDICT]);

        let err = parse_log(content.as_bytes(), &key()).unwrap_err();

        assert!(matches!(err, MalformedLog::InvalidCount { .. }));
    }

    #[test]
    fn test_should_reject_short_messages_line() {
        let content = log(&[VALIDATE, "messages = { INFO:1, WARN:0 }", VERDICT]);

        let err = parse_log(content.as_bytes(), &key()).unwrap_err();

        assert!(matches!(
            err,
            MalformedLog::TooFewCounts {
                section: "messages",
                expected: 6,
                found: 2
            }
        ));
    }

    #[test]
    fn test_should_reject_verdict_line_without_token() {
        let content = log(&[VALIDATE, MESSAGES, "Final Verdict pending"]);

        let err = parse_log(content.as_bytes(), &key()).unwrap_err();

        assert!(matches!(err, MalformedLog::MissingVerdictToken { .. }));
    }

    #[test]
    fn test_should_use_last_occurrence_of_each_line() {
        let content = log(&[
            "validate = { PASS:1, FAIL:1 }",
            ">>>> Final Verdict: FAIL - \"X\" <<<<",
            VALIDATE,
            MESSAGES,
            VERDICT,
        ]);

        let record = parse_log(content.as_bytes(), &key()).unwrap();

        assert_eq!(record.validate, ValidateCounts { pass: 5, fail: 2 });
        assert_eq!(record.final_verdict, "PASS");
    }

    #[test]
    fn test_should_tolerate_invalid_utf8_and_crlf() {
        let mut content = b"\xff\xfe garbage\r\n".to_vec();
        let crlf = log(&[VALIDATE, MESSAGES, VERDICT]).replace('\n', "\r\n");
        content.extend_from_slice(crlf.as_bytes());

        let record = parse_log(content.as_slice(), &key()).unwrap();

        assert_eq!(record.messages.info, 10);
        assert_eq!(record.final_verdict, "PASS");
    }

    #[test]
    fn test_should_skip_attempt_without_log() {
        let tree = MemoryTree::new().with_dir("Results/Run_20230303_084230899/X/1");

        let reason = parse_attempt(&tree, &key()).unwrap_err();

        assert!(matches!(reason, SkipReason::MissingLog));
    }

    #[test]
    fn test_should_parse_attempt_log_named_after_test() {
        let tree = MemoryTree::new()
            .with_file(
                "Results/Run_20230303_084230899/X/1/1.script.log",
                log(&[VALIDATE, MESSAGES, VERDICT]),
            )
            .with_file(
                "Results/Run_20230303_084230899/X/1/X.script.log",
                log(&[VALIDATE, MESSAGES, "12:00:00 >>>> Final Verdict: FAIL - \"X\" <<<<"]),
            );

        let record = parse_attempt(&tree, &key()).unwrap();

        assert_eq!(record.final_verdict, "FAIL");
    }

    #[test]
    fn test_should_skip_malformed_attempt_log() {
        let tree = MemoryTree::new().with_file(
            "Results/Run_20230303_084230899/X/1/X.script.log",
            log(&[VALIDATE, VERDICT]),
        );

        let reason = parse_attempt(&tree, &key()).unwrap_err();

        assert!(matches!(
            reason,
            SkipReason::Malformed(MalformedLog::MissingSection { .. })
        ));
    }
}
