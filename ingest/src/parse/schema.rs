use crate::parse::MalformedLog;

/// The counters `validate = { PASS:<n>, FAIL:<n> }` holds, in order
pub const VALIDATE_SCHEMA: CounterSchema = CounterSchema {
    section: "validate",
    labels: &["PASS", "FAIL"],
};

/// The counters `messages = { INFO:<n>, WARN:<n>, ... }` holds, in order
pub const MESSAGES_SCHEMA: CounterSchema = CounterSchema {
    section: "messages",
    labels: &["INFO", "WARN", "ERR", "PENDING", "INCONCLUSIVE", "N/A"],
};

/// The layout of one brace-delimited counter line in a script log.
///
/// Values are taken by position. The labels say what each position is expected to hold but are
/// never used to look a value up: if the harness reorders its labels, the counts are read in the
/// new order and only a warning is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSchema {
    section: &'static str,
    labels: &'static [&'static str],
}

/// One `LABEL:count` entry as it appears in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterEntry {
    pub label: String,
    pub count: u64,
}

/// A position whose label differs from the one the schema expects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMismatch {
    pub position: usize,
    pub expected: &'static str,
    pub found: String,
}

impl CounterSchema {
    pub fn section(&self) -> &'static str {
        self.section
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.labels
    }

    /// Whether `line` is this section's counter line
    pub fn matches(&self, line: &str) -> bool {
        line.starts_with(self.section)
    }

    /// Read every `LABEL:count` entry of a counter line.
    ///
    /// The entries are the text between the first and second `=`, with surrounding whitespace
    /// and braces removed, split on `,`. Each entry's count is the text between its first and
    /// second `:`. Every entry must hold a non-negative integer, including ones past the end
    /// of the schema.
    pub fn extract(&self, line: &str) -> Result<Vec<CounterEntry>, MalformedLog> {
        let body = line
            .split('=')
            .nth(1)
            .ok_or(MalformedLog::MissingAssignment {
                section: self.section,
            })?
            .trim()
            .trim_matches(|c| c == '{' || c == '}');

        body.split(',')
            .enumerate()
            .map(|(position, entry)| {
                let mut parts = entry.split(':');
                let label = parts.next().unwrap_or_default().trim().to_string();
                let value = parts.next().ok_or_else(|| MalformedLog::MissingCount {
                    section: self.section,
                    position,
                    entry: entry.trim().to_string(),
                })?;
                let count = value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| MalformedLog::InvalidCount {
                        section: self.section,
                        position,
                        value: value.trim().to_string(),
                    })?;

                Ok(CounterEntry { label, count })
            })
            .collect()
    }

    /// Positions among the first `labels().len()` entries whose label is not the expected one
    pub fn mismatches(&self, entries: &[CounterEntry]) -> Vec<LabelMismatch> {
        self.labels
            .iter()
            .zip(entries)
            .enumerate()
            .filter(|(_, (expected, entry))| entry.label != **expected)
            .map(|(position, (expected, entry))| LabelMismatch {
                position,
                expected: *expected,
                found: entry.label.clone(),
            })
            .collect()
    }

    /// The first `N` counts, by position
    ///
    /// Entries after the first `N` are ignored. Fewer than `N` entries is malformed.
    pub fn positional<const N: usize>(
        &self,
        entries: &[CounterEntry],
    ) -> Result<[u64; N], MalformedLog> {
        debug_assert_eq!(N, self.labels.len());

        if entries.len() < N {
            return Err(MalformedLog::TooFewCounts {
                section: self.section,
                expected: N,
                found: entries.len(),
            });
        }

        let mut counts = [0u64; N];
        for (slot, entry) in counts.iter_mut().zip(entries) {
            *slot = entry.count;
        }
        Ok(counts)
    }
}
