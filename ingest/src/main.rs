#[macro_use]
extern crate log;

use std::fs::File;
use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use clap::Parser as _;
use verdict_ingest::report::{self, group_thousands};
use verdict_ingest::store::JsonlStore;
use verdict_ingest::tree::FsTree;
use verdict_ingest::{collect_attempt_records, replace_collection, IngestReport};

use crate::cli::{CliArgs, Command};

mod cli;

const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = CliArgs::parse();
    info!("{CRATE_NAME} {CRATE_VERSION}");

    let store_path = args.store_path();
    let collection = args.collection_name();
    debug!("Using store {} and collection {collection}", store_path.display());
    let mut store = JsonlStore::open(&store_path)
        .with_context(|| format!("Failed to open store at {}", store_path.display()))?;

    match args.command {
        Command::Load {
            root,
            export,
            no_report,
        } => {
            info!("Importing results from {}", root.display());
            let outcome = collect_attempt_records(&FsTree::new(&root))
                .with_context(|| format!("Failed to walk results under {}", root.display()))?;

            let written = replace_collection(&mut store, &collection, &outcome.records)
                .with_context(|| format!("Failed to replace collection {collection}"))?;
            println!(
                "Total number of test attempt results: {}",
                group_thousands(written)
            );

            if let Some(export) = export {
                debug!("Exporting records to {}", export.display());
                verdict_model::append_attempt_records(&outcome.records, export.clone())
                    .with_context(|| format!("Failed to export records to {}", export.display()))?;
            }

            if !no_report {
                write_ingest_report(&IngestReport::new(&root, &collection, &outcome))?;
            }
        }
        Command::Report { top } => {
            let store = store
                .snapshot(&collection)
                .with_context(|| format!("Failed to read collection {collection}"))?;
            let counts = report::verdict_counts(&store, &collection)
                .with_context(|| format!("Failed to count verdicts in {collection}"))?;
            println!("Verdicts per test:");
            println!("{}", report::verdict_counts_table(&counts));

            let ratios = report::fail_to_pass_ratios(&store, &collection, top)
                .with_context(|| format!("Failed to compute ratios in {collection}"))?;
            println!("Highest FAIL / PASS ratios:");
            println!("{}", report::ratios_table(&ratios));
        }
        Command::Attempts { test } => {
            let store = store
                .snapshot(&collection)
                .with_context(|| format!("Failed to read collection {collection}"))?;
            let attempts = report::attempts_for_test(&store, &collection, &test)
                .with_context(|| format!("Failed to find attempts of {test} in {collection}"))?;
            if attempts.is_empty() {
                warn!("No attempts of {test} found in {collection}");
            }
            println!("{}", report::attempts_table(&attempts));
        }
    }

    Ok(())
}

fn write_ingest_report(report: &IngestReport) -> anyhow::Result<()> {
    let name = format!(
        "ingest-report-{}.json",
        Utc::now().format("%Y-%m-%dT%H.%M.%S%.fZ")
    );
    let file = File::create_new(Path::new(&name))
        .with_context(|| format!("Failed to create report file {name}"))?;
    serde_json::to_writer_pretty(file, report)?;

    if report.skipped.is_empty() {
        info!("Wrote import report to {name}");
    } else {
        warn!(
            "Skipped {} attempts, see {name} for details",
            report.skipped.len()
        );
    }

    Ok(())
}
