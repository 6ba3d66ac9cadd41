use std::path::PathBuf;

use clap::{Parser, Subcommand};
use verdict_ingest::report::DEFAULT_RATIO_LIMIT;

/// Environment variable name to set the document store directory
const STORE_PATH_ENV: &str = "VERDICT_STORE_PATH";
/// Default document store directory
const DEFAULT_STORE_PATH: &str = "verdict_store";
/// Environment variable name to set the collection name
const COLLECTION_ENV: &str = "VERDICT_COLLECTION";
/// Default collection holding the test attempt results
const DEFAULT_COLLECTION: &str = "test_results";

#[derive(Parser)]
#[command(about, version, long_about = None)]
pub struct CliArgs {
    /// Directory of the document store.
    ///
    /// Falls back to `VERDICT_STORE_PATH`, then to `verdict_store`.
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Collection holding the test attempt results.
    ///
    /// Falls back to `VERDICT_COLLECTION`, then to `test_results`.
    #[arg(long, global = true)]
    pub collection: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Import every test attempt under a results root, replacing the collection
    Load {
        /// Directory containing the `Results` folder.
        #[arg(long)]
        root: PathBuf,

        /// Also append the imported records to this JSON lines file.
        #[arg(long)]
        export: Option<PathBuf>,

        /// Do not write the `ingest-report-<timestamp>.json` file.
        #[arg(long, default_value = "false")]
        no_report: bool,
    },
    /// Show verdict counts per test and the tests with the most failed checks
    Report {
        /// The number of tests to show in the fail to pass ratio table
        #[arg(long, default_value_t = DEFAULT_RATIO_LIMIT)]
        top: usize,
    },
    /// Show every stored attempt of one test
    Attempts {
        /// Test name, as it appears in the results tree
        #[arg(long)]
        test: String,
    },
}

impl CliArgs {
    pub fn store_path(&self) -> PathBuf {
        self.store.clone().unwrap_or_else(|| {
            std::env::var(STORE_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE_PATH))
        })
    }

    pub fn collection_name(&self) -> String {
        self.collection.clone().unwrap_or_else(|| {
            std::env::var(COLLECTION_ENV).unwrap_or_else(|_| DEFAULT_COLLECTION.to_string())
        })
    }
}
