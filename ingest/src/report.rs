mod tables;

use crate::store::{document_to_record, DocumentStore, Filter, StoreError};
use itertools::Itertools;
use serde::Serialize;
use std::cmp::Ordering;
use verdict_model::{AttemptRecord, VERDICT_FAIL, VERDICT_PASS};

pub use tables::{attempts_table, ratios_table, verdict_counts_table};

/// Default number of tests shown in the fail to pass ratio report
pub const DEFAULT_RATIO_LIMIT: usize = 5;

/// How many attempts of one test ended with a PASS or FAIL verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerdictCounts {
    pub test_name: String,
    pub pass_count: usize,
    pub fail_count: usize,
}

/// The summed `validate` counters of one test over all of its attempts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailRatio {
    pub test_name: String,
    pub total_passes: u64,
    pub total_fails: u64,
    /// `total_fails / total_passes`, or `None` when nothing passed
    pub ratio: Option<f64>,
}

/// Count PASS and FAIL verdicts for every test in the collection.
///
/// Tests are listed in the order the store returns their distinct names. Verdicts other than
/// PASS and FAIL are counted in neither column.
pub fn verdict_counts<S>(store: &S, collection: &str) -> Result<Vec<VerdictCounts>, StoreError>
where
    S: DocumentStore + ?Sized,
{
    let mut counts = Vec::new();
    for test_name in store.distinct(collection, "test_name")? {
        let Some(test_name) = test_name.as_str() else {
            warn!("Ignoring non-string test name {test_name} in {collection}");
            continue;
        };

        let count_verdict = |verdict: &str| {
            store.count_documents(
                collection,
                &Filter::new()
                    .field_eq("test_name", test_name)
                    .field_eq("final_verdict", verdict),
            )
        };

        counts.push(VerdictCounts {
            test_name: test_name.to_string(),
            pass_count: count_verdict(VERDICT_PASS)?,
            fail_count: count_verdict(VERDICT_FAIL)?,
        });
    }

    Ok(counts)
}

/// The tests with the highest ratio of failed to passed checks.
///
/// Sums the `PASS` and `FAIL` counters of each test's attempts. Tests where nothing passed have
/// an unbounded ratio and sort first; ties are broken by test name. At most `limit` tests are
/// returned.
pub fn fail_to_pass_ratios<S>(
    store: &S,
    collection: &str,
    limit: usize,
) -> Result<Vec<FailRatio>, StoreError>
where
    S: DocumentStore + ?Sized,
{
    let records = store
        .find(collection, &Filter::new())?
        .into_iter()
        .map(document_to_record)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records
        .into_iter()
        .into_group_map_by(|record| record.test_name.clone())
        .into_iter()
        .map(|(test_name, attempts)| {
            let total_passes = attempts.iter().map(|r| r.validate.pass).sum::<u64>();
            let total_fails = attempts.iter().map(|r| r.validate.fail).sum::<u64>();
            FailRatio {
                test_name,
                total_passes,
                total_fails,
                ratio: (total_passes != 0).then(|| total_fails as f64 / total_passes as f64),
            }
        })
        .sorted_by(|a, b| {
            compare_ratio_desc(a.ratio, b.ratio).then_with(|| a.test_name.cmp(&b.test_name))
        })
        .take(limit)
        .collect())
}

/// Every stored attempt of one test, in insertion order.
pub fn attempts_for_test<S>(
    store: &S,
    collection: &str,
    test_name: &str,
) -> Result<Vec<AttemptRecord>, StoreError>
where
    S: DocumentStore + ?Sized,
{
    store
        .find(collection, &Filter::new().field_eq("test_name", test_name))?
        .into_iter()
        .map(document_to_record)
        .collect()
}

/// Format a count with `,` between groups of three digits, e.g. `12,345`
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn compare_ratio_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => b.total_cmp(&a),
    }
}
