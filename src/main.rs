use clap::{Parser, Subcommand};
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use zest_report::config;
use zest_report::report::{self, raw::RawRun};
use zest_report::zephyr::ZephyrClient;

/// Zest Report - step-level reporting for Playwright test runs
#[derive(Parser, Debug)]
#[command(
    name = "zest-report",
    about = "Reconcile planned and executed test steps into a JSON report, with console output and Zephyr sync",
    after_help = "ENVIRONMENT VARIABLES:\n\
        ZEST_OUTPUT_DIR        Output directory for reports (default: test-results)\n\
        PRINT_TEST_RESULTS     Render the console report when 'true'\n\
        SAVE_SCREENSHOTS       Export PNG attachments to disk when 'true'\n\
        UPDATE_TEST_RESULTS    Push results to Zephyr when 'true'\n\
        ZEPHYR_API_URL         Zephyr API base URL\n\
        ZEPHYR_API_KEY         Zephyr bearer token\n\
        ZEPHYR_TEST_CYCLE_KEY  Zephyr test cycle to update"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Transform a raw end-of-run results file into the reconciled report
    Report {
        /// Path to the runtime's end-of-run results JSON
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for the report (default: ZEST_OUTPUT_DIR)
        #[arg(short, long, env = "ZEST_OUTPUT_DIR")]
        output: Option<PathBuf>,

        /// Render the console report (also enabled via PRINT_TEST_RESULTS)
        #[arg(long)]
        print: bool,

        /// Export PNG attachments to disk (also enabled via SAVE_SCREENSHOTS)
        #[arg(long)]
        save_screenshots: bool,

        /// Push results to Zephyr (also enabled via UPDATE_TEST_RESULTS)
        #[arg(long)]
        sync: bool,
    },

    /// Render a previously written report to the console
    Print {
        /// Report file (default: <output-dir>/test-results.json)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Push a previously written report to Zephyr
    Sync {
        /// Report file (default: <output-dir>/test-results.json)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    match args.command {
        Some(Commands::Report {
            input,
            output,
            print,
            save_screenshots,
            sync,
        }) => {
            let data = fs::read_to_string(&input)?;
            let raw: RawRun = serde_json::from_str(&data)?;

            let mut rep = report::transform_run(raw);
            report::reconcile_report(&mut rep);

            let output_dir =
                output.unwrap_or_else(|| PathBuf::from(config::output_dir()));
            let report_path = report::save_report(&rep, &output_dir)?;

            if save_screenshots || config::save_screenshots() {
                let written = report::export_screenshots(&rep, &output_dir)?;
                println!("Saved {} screenshots to {}", written.len(), output_dir.display());
            }

            if print || config::print_results() {
                report::print_report(&rep);
            }

            if sync || config::update_results() {
                // Sync from the persisted file, so what Zephyr receives is
                // exactly what the report on disk says.
                let saved = report::load_report(&report_path)?;
                sync_to_zephyr(&saved);
            }
        }

        Some(Commands::Print { file }) => {
            let path = file.unwrap_or_else(default_report_path);
            let rep = report::load_report(&path)?;
            report::print_report(&rep);
        }

        Some(Commands::Sync { file }) => {
            let path = file.unwrap_or_else(default_report_path);
            let rep = report::load_report(&path)?;
            sync_to_zephyr(&rep);
        }

        None => {
            println!("Zest Report - step-level reporting for Playwright test runs");
            println!();
            println!("Usage: zest-report <COMMAND>");
            println!();
            println!("Commands:");
            println!("  report  Transform a raw results file into the reconciled report");
            println!("  print   Render a previously written report to the console");
            println!("  sync    Push a previously written report to Zephyr");
            println!();
            println!("Run with --help for more information.");
        }
    }

    Ok(())
}

fn default_report_path() -> PathBuf {
    PathBuf::from(config::output_dir()).join(report::REPORT_FILENAME)
}

/// Per-test sync failures are already isolated inside the client; a missing
/// configuration only disables the sync phase, it never fails the report.
fn sync_to_zephyr(rep: &report::Report) {
    println!("Updating test results in Zephyr...");
    match ZephyrClient::from_settings(&config::get().zephyr) {
        Ok(client) => {
            let synced = client.sync_report(rep);
            println!("Synced {}/{} tests", synced, rep.tests.len());
        }
        Err(err) => {
            eprintln!("Error updating test results: {}", err);
        }
    }
}
