use crate::report::{FailRatio, VerdictCounts};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use verdict_model::AttemptRecord;

#[derive(Tabled)]
struct VerdictCountsRow {
    #[tabled(rename = "Test")]
    test_name: String,
    #[tabled(rename = "Passed")]
    pass_count: usize,
    #[tabled(rename = "Failed")]
    fail_count: usize,
}

#[derive(Tabled)]
struct RatioRow {
    #[tabled(rename = "Test")]
    test_name: String,
    #[tabled(rename = "Total PASS")]
    total_passes: u64,
    #[tabled(rename = "Total FAIL")]
    total_fails: u64,
    #[tabled(rename = "FAIL / PASS")]
    ratio: String,
}

#[derive(Tabled)]
struct AttemptRow {
    #[tabled(rename = "Run")]
    run_name: String,
    #[tabled(rename = "Attempt")]
    attempt_name: String,
    #[tabled(rename = "Verdict")]
    final_verdict: String,
    #[tabled(rename = "PASS")]
    pass: u64,
    #[tabled(rename = "FAIL")]
    fail: u64,
    #[tabled(rename = "ERR")]
    err: u64,
    #[tabled(rename = "WARN")]
    warn: u64,
}

pub fn verdict_counts_table(counts: &[VerdictCounts]) -> String {
    render(counts.iter().map(|c| VerdictCountsRow {
        test_name: c.test_name.clone(),
        pass_count: c.pass_count,
        fail_count: c.fail_count,
    }))
}

pub fn ratios_table(ratios: &[FailRatio]) -> String {
    render(ratios.iter().map(|r| RatioRow {
        test_name: r.test_name.clone(),
        total_passes: r.total_passes,
        total_fails: r.total_fails,
        ratio: match r.ratio {
            Some(ratio) => format!("{ratio:.2}"),
            None => "Infinity".to_string(),
        },
    }))
}

pub fn attempts_table(records: &[AttemptRecord]) -> String {
    render(records.iter().map(|r| AttemptRow {
        run_name: r.run_name.clone(),
        attempt_name: r.attempt_name.clone(),
        final_verdict: r.final_verdict.clone(),
        pass: r.validate.pass,
        fail: r.validate.fail,
        err: r.messages.err,
        warn: r.messages.warn,
    }))
}

fn render<R: Tabled>(rows: impl IntoIterator<Item = R>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::modern());
    table.to_string()
}
